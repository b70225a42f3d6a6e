//! Governor, timelock and bridge receiver interfaces.

use alloy::sol;

sol! {
    #[sol(rpc)]
    contract IGovernor {
        /// Emitted when a new proposal is created.
        event ProposalCreated(
            uint256 id,
            address proposer,
            address[] targets,
            uint256[] values,
            string[] signatures,
            bytes[] calldatas,
            uint256 startBlock,
            uint256 endBlock,
            string description
        );

        /// Emitted when a proposal has been executed through the timelock.
        event ProposalExecuted(uint256 id);

        /// Total number of proposals ever created.
        function proposalCount() external view returns (uint256);

        /// Number of for-votes required for a proposal to succeed.
        function quorumVotes() external view returns (uint256);

        /// Executes a queued proposal whose timelock delay has elapsed.
        function execute(uint256 proposalId) external payable;
    }

    #[sol(rpc)]
    contract ITimelock {
        /// Minimum delay between queueing and execution, in seconds.
        function delay() external view returns (uint256);

        /// Whether a transaction hash is currently queued.
        function queuedTransactions(bytes32 hash) external view returns (bool);
    }

    /// Destination-side receiver for bridged governance batches.
    ///
    /// The bridge relayer delivers the raw action tuple to the receiver, which
    /// stores it as a local proposal behind its own timelock; anyone may
    /// execute it once the delay has elapsed.
    #[sol(rpc)]
    contract IBridgeReceiver {
        /// Identifier the next created proposal will be assigned.
        function nextProposalId() external view returns (uint256);

        /// Executes a stored proposal whose delay has elapsed.
        function executeProposal(uint256 proposalId) external payable;
    }
}
