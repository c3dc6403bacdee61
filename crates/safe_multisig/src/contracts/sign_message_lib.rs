use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    interface SignMessageLib {
        event SignMsg(bytes32 indexed msgHash);

        function signMessage(bytes calldata _data) external;

        function getMessageHash(bytes memory message) external view returns (bytes32);
    }
}
