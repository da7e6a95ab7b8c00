//! ABI wire format, generated at build time from the protocol's Solidity
//! interface the same way the teacher generates typed bindings for its
//! contracts: a `sol!` block stands in for `abigen`/`ethers`-style codegen,
//! giving us `SolValue::abi_encode`/`abi_decode` for free instead of a
//! runtime ABI decoder (see DESIGN.md, "Runtime reflection over ABI").
//!
//! Nothing outside this module should depend on the exact Solidity tuple
//! layout; [`crate`]'s public types are the ergonomic, non-ABI shape and
//! convert to/from these via `From`/`TryFrom`.
//!
//! The protocol declares `txListByteOffset`/`txListByteSize` as `uint24` and
//! deposit `amount` as `uint96`; ABI value types always occupy a full 32-byte
//! word regardless of declared width, so widening them to `uint32`/`uint128`
//! here produces byte-identical encodings for any in-range value while
//! giving native Rust integer types instead of `ruint` odd-width wrappers.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct BlockMetadataAbi {
        bytes32 l1Hash;
        bytes32 difficulty;
        bytes32 blobHash;
        bytes32 extraData;
        bytes32 depositsHash;
        address coinbase;
        uint64 id;
        uint32 gasLimit;
        uint64 timestamp;
        uint64 l1Height;
        uint32 txListByteOffset;
        uint32 txListByteSize;
        uint16 minTier;
        bool blobUsed;
        bytes32 parentMetaHash;
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TransitionAbi {
        bytes32 parentHash;
        bytes32 blockHash;
        bytes32 stateRoot;
        bytes32 graffiti;
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TierProofAbi {
        uint16 tier;
        bytes data;
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TierFeeAbi {
        uint16 tier;
        uint128 fee;
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct HookCallAbi {
        address hook;
        bytes data;
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct BlockParamsAbi {
        address assignedProver;
        address coinbase;
        bytes32 extraData;
        bytes32 blobHash;
        uint32 txListByteOffset;
        uint32 txListByteSize;
        bool cacheBlobForReuse;
        bytes32 parentMetaHash;
        HookCallAbi[] hookCalls;
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct ProverAssignmentAbi {
        address feeToken;
        uint64 expiry;
        uint64 maxBlockId;
        uint64 maxProposedIn;
        bytes32 metaHash;
        bytes32 parentMetaHash;
        TierFeeAbi[] tierFees;
        bytes signature;
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct DepositProcessedAbi {
        address recipient;
        uint128 amount;
        uint64 id;
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct ProveBlockInputAbi {
        BlockMetadataAbi meta;
        TransitionAbi tran;
        TierProofAbi proof;
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct AssignmentHookInputAbi {
        ProverAssignmentAbi assignment;
        uint256 tip;
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    event BlockProposed(
        uint256 indexed blockId,
        address indexed assignedProver,
        uint256 livenessBond,
        BlockMetadataAbi meta,
        DepositProcessedAbi[] depositsProcessed
    );

    #[derive(Debug, Clone, PartialEq, Eq)]
    event TransitionProved(
        uint256 indexed blockId,
        TransitionAbi tran,
        address indexed prover,
        uint256 validityBond,
        uint16 tier
    );

    #[derive(Debug, Clone, PartialEq, Eq)]
    event TransitionContested(
        uint256 indexed blockId,
        TransitionAbi tran,
        address indexed contester,
        uint256 contestBond,
        uint16 tier
    );

    #[derive(Debug, Clone, PartialEq, Eq)]
    event BlockVerified(
        uint256 indexed blockId,
        address indexed assignedProver,
        address indexed prover,
        bytes32 blockHash,
        bytes32 stateRoot,
        uint16 tier
    );

    interface ITaikoL1 {
        function proposeBlock(bytes calldata params, bytes calldata txList) external returns (BlockMetadataAbi memory meta);
        function proveBlock(uint64 blockId, bytes calldata input) external;
        function getStateVariables() external view returns (uint64 genesisHeight, uint64 numBlocks, uint64 lastVerifiedBlockId, uint64 lastVerifiedAt);
        function getConfig() external view returns (uint64 blockMaxGasLimit, uint64 blockMaxNumTxs, uint64 blockMaxTxListBytes, uint64 minTxGasLimit, uint256 livenessBond);
        function resolve(bytes32 name, bool allowZero) external view returns (address addr);
        // Simplified vs. the real protocol's richer return tuple: only the
        // block hash is needed for the last-verified-block mismatch check.
        function getBlock(uint64 blockId) external view returns (bytes32 blockHash);
    }

    interface ITaikoL2 {
        function anchor(bytes32 l1Hash, bytes32 l1StateRoot, uint64 l1Height, uint32 parentGasUsed) external;
        function getBasefee(uint64 l1Height, uint32 parentGasUsed) external view returns (uint256 basefee, uint64 parentGasUsed_);
    }

    interface IGuardianProver {
        function approve(BlockMetadataAbi calldata meta, TransitionAbi calldata tran, TierProofAbi calldata proof) external;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct TierDescriptorAbi {
        uint16 id;
        uint32 provingWindow;
    }

    interface ITierProvider {
        function getTiers() external view returns (TierDescriptorAbi[] memory tiers);
    }

    /// Mirrors the Go client's `proverAssignmentPayloadArgs`: the tuple an
    /// assignment signature commits to. Encoded with `abi_encode`, never
    /// sent on-chain directly — only its keccak256 digest is signed.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct ProverAssignmentPayloadAbi {
        string intent;
        uint64 chainId;
        address taikoL1;
        address assignmentHook;
        bytes32 metaHash;
        bytes32 parentMetaHash;
        bytes32 blobHash;
        address feeToken;
        uint64 expiry;
        uint64 maxBlockId;
        uint64 maxProposedIn;
        TierFeeAbi[] tierFees;
    }
}
