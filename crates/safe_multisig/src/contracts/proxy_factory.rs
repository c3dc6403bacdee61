use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    interface ProxyFactory {
        event ProxyCreation(address proxy, address singleton);

        /// Deploys a new proxy for the singleton and runs the initializer on it.
        /// The salt nonce is mixed into the CREATE2 salt.
        function createProxyWithNonce(
            address _singleton,
            bytes memory initializer,
            uint256 saltNonce
        ) external returns (address proxy);
    }
}
