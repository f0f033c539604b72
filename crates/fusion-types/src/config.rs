//! Configuration for a settlement engine instance.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, FusionError, Result, constants};

/// Fee bank deployment parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBankConfig {
    /// Address that custodies deposited fee tokens.
    pub address: Address,
    /// Operator allowed to gather fees.
    pub owner: Address,
    /// The single fee-denominated token.
    pub fee_token: Address,
}

impl Default for FeeBankConfig {
    fn default() -> Self {
        Self {
            address: Address::repeat_byte(0xfb),
            owner: Address::repeat_byte(0x0f),
            fee_token: Address::repeat_byte(0x1c),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Address every order extension must be routed to.
    pub settlement_address: Address,
    /// Address of the order-filling protocol (spender for maker and
    /// resolver token pulls).
    pub limit_order_protocol: Address,
    pub fee_bank: FeeBankConfig,
    /// Credit units per unit of resolver fee rate on a full fill.
    pub order_fee_base_points: Amount,
    /// Denominator for integrator fee rates.
    pub integrator_fee_base: Amount,
    /// Maximum number of nested fills in one settlement.
    pub max_chain_depth: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            settlement_address: Address::repeat_byte(0x5e),
            limit_order_protocol: Address::repeat_byte(0x10),
            fee_bank: FeeBankConfig::default(),
            order_fee_base_points: constants::DEFAULT_ORDER_FEE_BASE_POINTS,
            integrator_fee_base: constants::DEFAULT_INTEGRATOR_FEE_BASE,
            max_chain_depth: constants::DEFAULT_MAX_CHAIN_DEPTH,
        }
    }
}

impl SettlementConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.order_fee_base_points == 0 {
            return Err(FusionError::Configuration(
                "order_fee_base_points must be > 0".into(),
            ));
        }
        if self.integrator_fee_base == 0 {
            return Err(FusionError::Configuration(
                "integrator_fee_base must be > 0".into(),
            ));
        }
        if self.max_chain_depth == 0 {
            return Err(FusionError::Configuration(
                "max_chain_depth must be > 0".into(),
            ));
        }
        let contracts = [
            self.settlement_address,
            self.limit_order_protocol,
            self.fee_bank.address,
        ];
        for (i, a) in contracts.iter().enumerate() {
            if a.is_zero() {
                return Err(FusionError::Configuration(format!(
                    "contract address {i} is zero"
                )));
            }
            if contracts[i + 1..].contains(a) {
                return Err(FusionError::Configuration(format!(
                    "contract address {a} used twice"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = SettlementConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.order_fee_base_points, 1_000_000_000_000_000);
        assert_eq!(cfg.integrator_fee_base, 1_000_000_000);
        assert_eq!(cfg.max_chain_depth, 16);
    }

    #[test]
    fn json_roundtrip() {
        let cfg = SettlementConfig::default();
        let json = cfg.to_json().unwrap();
        let back = SettlementConfig::from_json(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn zero_depth_rejected() {
        let cfg = SettlementConfig {
            max_chain_depth: 0,
            ..SettlementConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(FusionError::Configuration(_))));
    }

    #[test]
    fn colliding_addresses_rejected() {
        let mut cfg = SettlementConfig::default();
        cfg.fee_bank.address = cfg.settlement_address;
        assert!(matches!(cfg.validate(), Err(FusionError::Configuration(_))));
    }

    #[test]
    fn bad_json_is_serialization_error() {
        let err = SettlementConfig::from_json("{").unwrap_err();
        assert!(matches!(err, FusionError::Serialization(_)));
    }
}
