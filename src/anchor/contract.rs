//! On-chain anchor backend.

use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use async_trait::async_trait;
use tokio::time::timeout;

use crate::anchor::backend::AnchorBackend;
use crate::anchor::types::{AnchorError, AnchorReceipt};
use crate::blockchain::wallet::Wallet;
use crate::chain::anchor_map::AnchorPair;
use crate::config::schema::{AnchorConfig, NetworkConfig};

/// JSON-RPC error code wallets use for "user rejected the request" (EIP-1193).
const USER_REJECTED_CODE: i64 = 4001;

sol! {
    /// Registry of anchored digest pairs.
    #[sol(rpc)]
    contract AnchorRegistry {
        struct Anchor {
            bytes32 key;
            bytes32 value;
        }

        /// Emitted once per anchored pair.
        #[derive(Debug)]
        event Anchored(bytes32 indexed key, bytes32 value, address indexed sender, uint64 timestamp);

        function anchor(Anchor[] calldata anchors) external;

        function maxAnchors() external view returns (uint256);
    }
}

/// Anchors pairs by calling the registry contract from the wallet.
pub struct ContractAnchor {
    provider: DynProvider,
    contract: Option<AnchorRegistry::AnchorRegistryInstance<DynProvider>>,
    chain_id: u64,
    rpc_timeout: Duration,
    confirmation_timeout: Duration,
}

impl ContractAnchor {
    /// Connect `wallet` to `network`.
    ///
    /// A network without an anchor contract is accepted; submitting then
    /// fails with [`AnchorError::NoContract`].
    pub fn new(
        wallet: &Wallet,
        network: &NetworkConfig,
        config: &AnchorConfig,
    ) -> Result<Self, AnchorError> {
        let url: url::Url = network.rpc_url.parse().map_err(|e| {
            AnchorError::Rpc(format!("Invalid RPC URL '{}': {}", network.rpc_url, e))
        })?;

        let contract_address = match &network.anchor_contract {
            Some(addr) => Some(addr.parse::<Address>().map_err(|e| {
                AnchorError::Contract(format!("Invalid contract address '{}': {}", addr, e))
            })?),
            None => None,
        };

        let provider = ProviderBuilder::new()
            .wallet(wallet.ethereum_wallet())
            .connect_http(url)
            .erased();
        let contract =
            contract_address.map(|address| AnchorRegistry::new(address, provider.clone()));

        tracing::info!(
            network = %network.name,
            chain_id = network.chain_id,
            contract = ?contract_address,
            sender = %wallet.address(),
            "Contract anchor backend ready"
        );

        Ok(Self {
            provider,
            contract,
            chain_id: network.chain_id,
            rpc_timeout: Duration::from_secs(config.rpc_timeout_secs),
            confirmation_timeout: Duration::from_secs(config.confirmation_timeout_secs),
        })
    }

    fn contract(&self) -> Result<&AnchorRegistry::AnchorRegistryInstance<DynProvider>, AnchorError> {
        self.contract
            .as_ref()
            .ok_or(AnchorError::NoContract(self.chain_id))
    }
}

#[async_trait]
impl AnchorBackend for ContractAnchor {
    async fn active_chain_id(&self) -> Result<u64, AnchorError> {
        match timeout(self.rpc_timeout, self.provider.get_chain_id()).await {
            Ok(Ok(chain_id)) => Ok(chain_id),
            Ok(Err(e)) => Err(AnchorError::Rpc(e.to_string())),
            Err(_) => Err(AnchorError::Timeout(self.rpc_timeout.as_secs())),
        }
    }

    async fn max_anchors(&self) -> Result<usize, AnchorError> {
        let contract = self.contract()?;
        let max = match timeout(self.rpc_timeout, contract.maxAnchors().call()).await {
            Ok(Ok(max)) => max,
            Ok(Err(e)) => return Err(AnchorError::Rpc(e.to_string())),
            Err(_) => return Err(AnchorError::Timeout(self.rpc_timeout.as_secs())),
        };
        Ok(max.saturating_to::<usize>())
    }

    async fn submit(&self, pairs: &[AnchorPair]) -> Result<AnchorReceipt, AnchorError> {
        let contract = self.contract()?;
        let anchors: Vec<AnchorRegistry::Anchor> = pairs
            .iter()
            .map(|pair| AnchorRegistry::Anchor {
                key: pair.key,
                value: pair.value,
            })
            .collect();

        let call = contract.anchor(anchors);
        let pending = match timeout(self.rpc_timeout, call.send()).await {
            Ok(Ok(pending)) => pending,
            Ok(Err(e)) => return Err(classify_contract_error(e)),
            Err(_) => return Err(AnchorError::Timeout(self.rpc_timeout.as_secs())),
        };

        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, pairs = pairs.len(), "Anchor transaction sent");

        let receipt = match timeout(self.confirmation_timeout, pending.get_receipt()).await {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => return Err(AnchorError::Rpc(e.to_string())),
            Err(_) => {
                return Err(AnchorError::Unconfirmed {
                    tx_hash,
                    after_secs: self.confirmation_timeout.as_secs(),
                })
            }
        };

        let success = receipt.status();
        Ok(AnchorReceipt {
            tx_hash,
            block_number: receipt.block_number,
            gas_used: Some(receipt.gas_used as u64),
            success,
            revert_reason: (!success).then(|| "Transaction reverted".to_string()),
        })
    }
}

/// Map a failed anchor transaction onto the anchor error taxonomy.
fn classify_contract_error(err: alloy::contract::Error) -> AnchorError {
    if let alloy::contract::Error::TransportError(rpc) = &err {
        if let Some(payload) = rpc.as_error_resp() {
            if payload.code == USER_REJECTED_CODE {
                return AnchorError::Rejected;
            }
            // Reverts during gas estimation surface as error responses
            return AnchorError::Contract(payload.message.to_string());
        }
    }
    AnchorError::Rpc(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;
    use alloy::sol_types::SolCall;

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn network(contract: Option<&str>) -> NetworkConfig {
        NetworkConfig {
            chain_id: 31337,
            name: "anvil".to_string(),
            rpc_url: "http://127.0.0.1:1".to_string(),
            failover_urls: Vec::new(),
            anchor_contract: contract.map(str::to_string),
        }
    }

    #[test]
    fn test_anchor_call_encoding() {
        let call = AnchorRegistry::anchorCall {
            anchors: vec![AnchorRegistry::Anchor {
                key: B256::repeat_byte(1),
                value: B256::repeat_byte(2),
            }],
        };
        let encoded = call.abi_encode();
        // selector + offset + length + one (bytes32, bytes32) tuple
        assert_eq!(encoded.len(), 4 + 32 * 4);
        assert_eq!(&encoded[..4], AnchorRegistry::anchorCall::SELECTOR.as_slice());
    }

    #[tokio::test]
    async fn test_missing_contract() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 31337).unwrap();
        let backend =
            ContractAnchor::new(&wallet, &network(None), &AnchorConfig::default()).unwrap();
        assert_eq!(
            backend.max_anchors().await.unwrap_err(),
            AnchorError::NoContract(31337)
        );
    }

    #[test]
    fn test_invalid_contract_address() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 31337).unwrap();
        let result = ContractAnchor::new(&wallet, &network(Some("0xnope")), &AnchorConfig::default());
        assert!(matches!(result, Err(AnchorError::Contract(_))));
    }

    #[tokio::test]
    async fn test_unreachable_rpc() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 31337).unwrap();
        let backend = ContractAnchor::new(
            &wallet,
            &network(Some("0x5FbDB2315678afecb367f032d93F642f64180aa3")),
            &AnchorConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            backend.active_chain_id().await,
            Err(AnchorError::Rpc(_)) | Err(AnchorError::Timeout(_))
        ));
    }
}
