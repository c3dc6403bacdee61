use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    interface Safe {
        event ExecutionSuccess(bytes32 txHash, uint256 payment);
        event ExecutionFailure(bytes32 txHash, uint256 payment);
        event ApproveHash(bytes32 indexed approvedHash, address indexed owner);

        function VERSION() external view returns (string memory);

        function nonce() external view returns (uint256);

        function getThreshold() external view returns (uint256);

        function getOwners() external view returns (address[] memory);

        function isOwner(address owner) external view returns (bool);

        function getChainId() external view returns (uint256);

        function approvedHashes(address owner, bytes32 hash) external view returns (uint256);

        /// Marks a hash as approved by the sender. Used by pre-validated signatures.
        function approveHash(bytes32 hashToApprove) external;

        function getTransactionHash(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address refundReceiver,
            uint256 _nonce
        ) external view returns (bytes32);

        function execTransaction(
            address to,
            uint256 value,
            bytes calldata data,
            uint8 operation,
            uint256 safeTxGas,
            uint256 baseGas,
            uint256 gasPrice,
            address gasToken,
            address payable refundReceiver,
            bytes memory signatures
        ) external payable returns (bool success);

        function addOwnerWithThreshold(address owner, uint256 _threshold) external;

        function swapOwner(address prevOwner, address oldOwner, address newOwner) external;

        function setup(
            address[] calldata _owners,
            uint256 _threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address payable paymentReceiver
        ) external;
    }
}
