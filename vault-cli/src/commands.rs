use alloy::primitives::{Address, B256};
use alloy::providers::Provider;
use anyhow::Context;
use vault_runtime::accounts::list_balances;
use vault_runtime::create2::{compute_create2_address, init_code_hash, parse_salt, salt_for_name};
use vault_runtime::{
    ChainClient, Config, VaultClient, VaultFactoryClient, VaultKind, artifact, deployer,
};

use crate::cli::{ChainCommand, Cli, Command, vault_kind};

/// Blocks scanned by `events` when no `--from-block` is given.
const EVENTS_LOOKBACK: u64 = 10_000;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.network, cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(url) = cli.rpc_url {
        config.rpc_url = url;
    }
    if let Some(factory) = cli.factory {
        config.factory = factory;
    }

    tracing::info!(
        network = %config.network,
        rpc = %config.rpc_url,
        factory = %config.factory,
        "Using configuration"
    );

    match cli.command {
        Command::PredictAddress {
            name,
            init_code_hash: hash,
            artifact,
        } => predict_address(&config, &name, hash, &artifact),
        Command::Chain(command) => {
            let chain = ChainClient::from_config(&config)?;
            chain.verify_chain_id().await?;
            run_online(&chain, &config, command).await
        }
    }
}

async fn run_online(
    chain: &ChainClient,
    config: &Config,
    command: ChainCommand,
) -> anyhow::Result<()> {
    let factory = VaultFactoryClient::new(chain, config.factory);

    match command {
        ChainCommand::Accounts => {
            for account in list_balances(chain.provider(), &chain.accounts()).await? {
                println!(
                    "address: {} balance: {}",
                    account.address,
                    account.balance_ether()
                );
            }
        }
        ChainCommand::GetProxyAddress { name } => {
            let address = factory.compute_proxy_address(&name).await?;
            println!("Proxy Address: {address}");
        }
        ChainCommand::GetVaultAddress { name, legacy } => {
            let kind = vault_kind(false, legacy);
            let address = factory.predicted_address(kind, &name).await?;
            println!("Vault Address: {address}");
        }
        ChainCommand::DeployProxy { name, owner } => {
            let deployment = factory.deploy_proxy(&name, owner).await?;
            println!("Proxy Address: {}", deployment.address);
            println!("Transaction: {}", deployment.tx_hash);
        }
        ChainCommand::DeployVault {
            name,
            owner,
            legacy,
        } => {
            let kind = vault_kind(false, legacy);
            let deployment = factory.deploy(kind, &name, owner).await?;
            println!("Vault Address: {}", deployment.address);
            println!("Transaction: {}", deployment.tx_hash);
        }
        ChainCommand::GetProxyOwner { name } => {
            let owner = owner_of(chain, &factory, VaultKind::Proxy, &name).await?;
            println!("Proxy Owner: {owner}");
        }
        ChainCommand::GetVaultOwner { name, legacy } => {
            let kind = vault_kind(false, legacy);
            let owner = owner_of(chain, &factory, kind, &name).await?;
            println!("Vault Owner: {owner}");
        }
        ChainCommand::Withdraw {
            name,
            proxy,
            legacy,
        } => {
            let kind = vault_kind(proxy, legacy);
            let address = factory.predicted_address(kind, &name).await?;
            let receipt = VaultClient::new(chain, address).withdraw().await?;
            println!(
                "Withdrew {} from {address}",
                alloy::primitives::utils::format_ether(receipt.amount)
            );
            println!("Transaction: {}", receipt.tx_hash);
        }
        ChainCommand::Events { from_block } => {
            let from_block = match from_block {
                Some(block) => block,
                None => chain
                    .provider()
                    .get_block_number()
                    .await?
                    .saturating_sub(EVENTS_LOOKBACK),
            };
            let events = factory.vault_created_events(from_block).await?;
            if events.is_empty() {
                println!("No VaultCreated events since block {from_block}");
            }
            for event in events {
                println!(
                    "vault: {} block: {} tx: {}",
                    event.vault,
                    event.block_number.map(|b| b.to_string()).unwrap_or_default(),
                    event.tx_hash.map(|h| h.to_string()).unwrap_or_default()
                );
            }
        }
        ChainCommand::DeployFactory {
            owner,
            deterministic,
            salt,
        } => {
            let owner = owner.unwrap_or(config.factory_owner);
            let salt = match (deterministic, salt) {
                (false, _) => None,
                (true, Some(salt)) => Some(parse_salt(&salt)?),
                (true, None) => Some(config.create2_salt),
            };
            let deployment =
                deployer::deploy_factory(chain, &config.artifacts_dir, owner, salt).await?;
            println!("VaultFactory Address: {}", deployment.address);
            match deployment.tx_hash {
                Some(hash) => println!("Transaction: {hash}"),
                None => println!("Already deployed"),
            }
        }
        ChainCommand::DeployImplementation { salt } => {
            let salt = parse_salt(&salt)?;
            let deployment =
                deployer::deploy_vault_implementation(chain, &config.artifacts_dir, salt).await?;
            println!("Vault Address: {}", deployment.address);
            match deployment.tx_hash {
                Some(hash) => println!("Transaction: {hash}"),
                None => println!("Already deployed"),
            }
        }
    }

    Ok(())
}

fn predict_address(
    config: &Config,
    name: &str,
    hash: Option<B256>,
    artifact_name: &str,
) -> anyhow::Result<()> {
    let hash = match hash {
        Some(hash) => hash,
        None => {
            let code = artifact::load_bytecode(&config.artifacts_dir, artifact_name)
                .with_context(|| format!("Cannot read init code for {artifact_name}"))?;
            init_code_hash(&code)
        }
    };
    let address = compute_create2_address(config.factory, salt_for_name(name), hash);
    println!("Predicted Address: {address}");
    Ok(())
}

async fn owner_of(
    chain: &ChainClient,
    factory: &VaultFactoryClient<'_>,
    kind: VaultKind,
    name: &str,
) -> anyhow::Result<Address> {
    let address = factory.predicted_address(kind, name).await?;
    if chain.provider().get_code_at(address).await?.is_empty() {
        anyhow::bail!("No {kind} vault named '{name}' is deployed (expected at {address})");
    }
    Ok(VaultClient::new(chain, address).owner().await?)
}
