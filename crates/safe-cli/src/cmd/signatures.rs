use alloy_primitives::Address;
use clap::Parser;
use colored::Colorize;
use safe_multisig::{
    generate_signatures_from_confirmations, signatures::SIGNATURE_LENGTH, Confirmation,
};

use crate::{
    cmd::utils::{address_translator, parse_confirmation, print_field},
    runner::CliContext,
};

#[derive(Debug, Parser)]
#[clap(about = "Assemble the signatures argument of execTransaction from owner confirmations.")]
pub struct SignaturesCommand {
    #[arg(
        value_name = "CONFIRMATION",
        value_parser = parse_confirmation,
        help = "OWNER:SIGNATURE of an off-chain confirmation, or OWNER for an on-chain approval."
    )]
    confirmations: Vec<Confirmation>,

    #[arg(long, value_name = "OWNER", help = "Executing owner, added as pre-validated signature.")]
    pre_approving_owner: Option<Address>,
}

impl SignaturesCommand {
    pub async fn execute(self, ctx: CliContext) -> eyre::Result<()> {
        let Self { confirmations, pre_approving_owner } = self;

        let translator = address_translator(&ctx.config);
        let blob = generate_signatures_from_confirmations(
            &confirmations,
            pre_approving_owner,
            translator.as_ref(),
        )
        .await?;

        let count = blob.len() / SIGNATURE_LENGTH;
        println!("{}", format!("Assembled {count} signatures.").bright_green());
        print_field("Signatures", blob.as_bytes());

        Ok(())
    }
}
