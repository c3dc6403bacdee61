use alloy_primitives::Address;

use crate::{
    address::{translate_each, AddressTranslator, Direction},
    gateway::AddressEx,
};

/// Merges the owners reported by the gateway with the locally stored ones.
///
/// Remote owners are execution-layer addresses and come back as external accounts, owners
/// without a counterpart are left out. Without remote data the local list is returned as is.
pub async fn build_safe_owners<T>(
    remote: Option<&[AddressEx]>,
    local: Option<Vec<Address>>,
    translator: &T,
) -> Option<Vec<Address>>
where
    T: AddressTranslator + ?Sized,
{
    match remote {
        Some(remote) => {
            let internal = remote.iter().map(|owner| owner.value);
            Some(translate_each(translator, internal, Direction::ToExternal).await)
        }
        None => local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::StaticAddressDirectory;

    #[tokio::test]
    async fn remote_owners_are_translated_and_filtered() {
        let directory: StaticAddressDirectory =
            [(Address::repeat_byte(1), Address::repeat_byte(0xa1))].into_iter().collect();
        let remote = [AddressEx::from(Address::repeat_byte(0xa1)), AddressEx::from(Address::repeat_byte(0xa2))];

        let owners = build_safe_owners(Some(&remote), Some(vec![Address::ZERO]), &directory).await;

        assert_eq!(owners, Some(vec![Address::repeat_byte(1)]));
    }

    #[tokio::test]
    async fn local_owners_without_remote() {
        let local = vec![Address::repeat_byte(3)];
        let owners =
            build_safe_owners(None, Some(local.clone()), &StaticAddressDirectory::new()).await;

        assert_eq!(owners, Some(local));
        assert_eq!(build_safe_owners(None, None, &StaticAddressDirectory::new()).await, None);
    }
}
