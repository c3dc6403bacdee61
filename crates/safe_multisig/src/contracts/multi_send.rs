use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    interface MultiSendCallOnly {
        /// Executes packed transactions, each one operation, to, value, data length and data.
        function multiSend(bytes memory transactions) external payable;
    }
}
