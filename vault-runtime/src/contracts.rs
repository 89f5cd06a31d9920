//! Solidity contract bindings for the vault factory system.
//!
//! Uses alloy's `sol!` macro to generate type-safe ABI encoders/decoders
//! and RPC instances for `VaultFactory` and `Vault`.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IVaultFactory {
        event VaultCreated(address vault);

        error Create2FailedDeployment();

        function computeAddress(string calldata name) external view returns (address);
        function computeVaultAddress(string calldata name) external view returns (address);
        function computeProxyAddress(string calldata name) external view returns (address);

        function deployVault(string calldata name, address owner) external;
        function deployVaultWithNewSalt(string calldata name, address owner) external;
        function deployVaultUpgradeableBeacon(string calldata name, address owner) external;
    }

    #[sol(rpc)]
    interface IVault {
        event Withdrawal(uint256 amount, uint256 when);

        function getOwner() external view returns (address);
        function withdraw() external;
    }
}
