//! Mutable ledger state behind the simulated chain

use crate::amount::{self, Amount};
use crate::call::{ContractCall, Event, OracleReading};
use crate::error::ChainError;
use crate::role::Role;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use upgrade_registry::Address;

/// One account; contracts carry an artifact name
#[derive(Debug, Clone, Default)]
pub(crate) struct SimAccount {
    pub(crate) artifact: Option<String>,
    pub(crate) native: Amount,
    pub(crate) paused: bool,
    pub(crate) storage: BTreeMap<String, Value>,
    pub(crate) oracle: Option<OracleReading>,
}

/// Whole-ledger state; cloned wholesale for atomic batches
///
/// Roles live in one global access-control table, the way a single core
/// contract guards every component of the system.
#[derive(Debug, Clone, Default)]
pub(crate) struct SimState {
    pub(crate) accounts: HashMap<Address, SimAccount>,
    pub(crate) tokens: HashMap<(Address, Address), Amount>,
    pub(crate) roles: BTreeMap<Role, BTreeSet<Address>>,
    pub(crate) nonces: HashMap<Address, u64>,
}

impl SimState {
    pub(crate) fn account_mut(&mut self, address: Address) -> &mut SimAccount {
        self.accounts.entry(address).or_default()
    }

    pub(crate) fn contract(&self, address: Address) -> Result<&SimAccount, ChainError> {
        match self.accounts.get(&address) {
            Some(account) if account.artifact.is_some() => Ok(account),
            _ => Err(ChainError::NoCode(address)),
        }
    }

    fn contract_mut(&mut self, address: Address) -> Result<&mut SimAccount, ChainError> {
        match self.accounts.get_mut(&address) {
            Some(account) if account.artifact.is_some() => Ok(account),
            _ => Err(ChainError::NoCode(address)),
        }
    }

    pub(crate) fn has_role(&self, role: &str, account: Address) -> bool {
        self.roles
            .get(&Role::new(role))
            .is_some_and(|holders| holders.contains(&account))
    }

    fn require_any_role(&self, roles: &[&str], sender: Address) -> Result<(), ChainError> {
        if roles.iter().any(|role| self.has_role(role, sender)) {
            Ok(())
        } else {
            Err(ChainError::reverted(format!(
                "{sender} lacks {}",
                roles.join(" or ")
            )))
        }
    }

    pub(crate) fn credit(&mut self, account: Address, amount: Amount) {
        let entry = &mut self.account_mut(account).native;
        *entry = entry.saturating_add(amount);
    }

    fn debit(&mut self, account: Address, amount: Amount) -> Result<(), ChainError> {
        let entry = &mut self.account_mut(account).native;
        *entry = entry
            .checked_sub(amount)
            .ok_or_else(|| ChainError::reverted("insufficient native balance"))?;
        Ok(())
    }

    /// Install code at a fresh address derived from deployer and nonce
    ///
    /// A single object argument seeds named storage; anything else is
    /// stored positionally under `arg0`, `arg1`, ...
    pub(crate) fn deploy(&mut self, deployer: Address, artifact: &str, args: &[Value]) -> Address {
        let nonce = self.nonces.entry(deployer).or_insert(0);
        let mut hasher = blake3::Hasher::new();
        hasher.update(deployer.as_bytes());
        hasher.update(&nonce.to_be_bytes());
        *nonce += 1;
        let address = Address::from_digest(hasher.finalize().as_bytes());

        let storage = match args {
            [Value::Object(fields)] => fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => args
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("arg{i}"), v.clone()))
                .collect(),
        };

        let account = self.account_mut(address);
        account.artifact = Some(artifact.to_string());
        account.storage = storage;
        address
    }

    /// Apply one call, returning its events
    pub(crate) fn apply_call(
        &mut self,
        sender: Address,
        call: &ContractCall,
    ) -> Result<Vec<Event>, ChainError> {
        let target = call.target;
        self.contract(target)?;

        if call.value > 0 {
            self.debit(sender, call.value)?;
            self.credit(target, call.value);
        }

        let method = call.method.as_str();
        if let Some((role, grant)) = role_shorthand(method) {
            let account = arg_address(call, 0)?;
            self.require_any_role(&[Role::GOVERN], sender)?;
            return Ok(vec![self.set_role(Role::new(role), account, grant)]);
        }

        let event = match method {
            "grantRole" | "revokeRole" => {
                let role = Role::new(arg_str(call, 0)?);
                let account = arg_address(call, 1)?;
                self.require_any_role(&[Role::GOVERN], sender)?;
                self.set_role(role, account, method == "grantRole")
            }
            "pause" | "unpause" => {
                self.require_any_role(&[Role::GOVERN, Role::GUARDIAN], sender)?;
                let paused = method == "pause";
                self.contract_mut(target)?.paused = paused;
                Event::new(
                    target,
                    if paused { "Paused" } else { "Unpaused" },
                    json!({ "account": sender }),
                )
            }
            "mint" => {
                let to = arg_address(call, 0)?;
                let amount = arg_amount(call, 1)?;
                self.require_any_role(&[Role::MINTER], sender)?;
                self.require_unpaused(target)?;
                let balance = self.tokens.entry((target, to)).or_insert(0);
                *balance = balance.saturating_add(amount);
                transfer_event(target, Address::ZERO, to, amount)
            }
            "transfer" => {
                let to = arg_address(call, 0)?;
                let amount = arg_amount(call, 1)?;
                self.require_unpaused(target)?;
                self.move_tokens(target, sender, to, amount)?;
                transfer_event(target, sender, to, amount)
            }
            "burn" => {
                let amount = arg_amount(call, 0)?;
                self.require_unpaused(target)?;
                self.move_tokens(target, sender, Address::ZERO, amount)?;
                self.tokens.remove(&(target, Address::ZERO));
                transfer_event(target, sender, Address::ZERO, amount)
            }
            "setStorage" => {
                let key = arg_str(call, 0)?.to_string();
                let value = arg(call, 1)?.clone();
                self.require_any_role(&[Role::GOVERN], sender)?;
                self.contract_mut(target)?
                    .storage
                    .insert(key.clone(), value.clone());
                Event::new(target, "StorageSet", json!({ "key": key, "value": value }))
            }
            "setOracle" => {
                let value = arg_amount(call, 0)?;
                let valid = match call.arguments.get(1) {
                    Some(v) => v
                        .as_bool()
                        .ok_or_else(|| ChainError::invalid_argument(method, "argument 1 is not a bool"))?,
                    None => true,
                };
                self.require_any_role(&[Role::GOVERN], sender)?;
                self.contract_mut(target)?.oracle = Some(OracleReading { value, valid });
                Event::new(
                    target,
                    "OracleUpdate",
                    json!({ "value": value.to_string(), "valid": valid }),
                )
            }
            other => return Err(ChainError::reverted(format!("unknown method {other}"))),
        };

        Ok(vec![event])
    }

    fn set_role(&mut self, role: Role, account: Address, grant: bool) -> Event {
        let name = if grant { "RoleGranted" } else { "RoleRevoked" };
        let data = json!({ "role": role, "account": account });
        let holders = self.roles.entry(role).or_default();
        if grant {
            holders.insert(account);
        } else {
            holders.remove(&account);
        }
        Event::new(Address::ZERO, name, data)
    }

    fn require_unpaused(&self, target: Address) -> Result<(), ChainError> {
        if self.contract(target)?.paused {
            Err(ChainError::reverted("Pausable: paused"))
        } else {
            Ok(())
        }
    }

    fn move_tokens(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), ChainError> {
        let from_balance = self.tokens.entry((token, from)).or_insert(0);
        *from_balance = from_balance
            .checked_sub(amount)
            .ok_or_else(|| ChainError::reverted("ERC20: transfer amount exceeds balance"))?;
        let to_balance = self.tokens.entry((token, to)).or_insert(0);
        *to_balance = to_balance.saturating_add(amount);
        Ok(())
    }
}

/// Shorthand role methods exposed by the core contract
fn role_shorthand(method: &str) -> Option<(&'static str, bool)> {
    let (grant, rest) = if let Some(rest) = method.strip_prefix("grant") {
        (true, rest)
    } else if let Some(rest) = method.strip_prefix("revoke") {
        (false, rest)
    } else {
        return None;
    };
    let role = match rest {
        "Governor" => Role::GOVERN,
        "Guardian" => Role::GUARDIAN,
        "Minter" => Role::MINTER,
        "Burner" => Role::BURNER,
        "PCVController" => Role::PCV_CONTROLLER,
        _ => return None,
    };
    Some((role, grant))
}

fn transfer_event(token: Address, from: Address, to: Address, amount: Amount) -> Event {
    Event::new(
        token,
        "Transfer",
        json!({ "from": from, "to": to, "value": amount.to_string() }),
    )
}

fn arg(call: &ContractCall, index: usize) -> Result<&Value, ChainError> {
    call.arguments
        .get(index)
        .ok_or_else(|| ChainError::invalid_argument(&call.method, format!("missing argument {index}")))
}

fn arg_str(call: &ContractCall, index: usize) -> Result<&str, ChainError> {
    arg(call, index)?
        .as_str()
        .ok_or_else(|| ChainError::invalid_argument(&call.method, format!("argument {index} is not a string")))
}

fn arg_address(call: &ContractCall, index: usize) -> Result<Address, ChainError> {
    arg_str(call, index)?
        .parse()
        .map_err(|e| ChainError::invalid_argument(&call.method, format!("argument {index}: {e}")))
}

fn arg_amount(call: &ContractCall, index: usize) -> Result<Amount, ChainError> {
    let parsed = match arg(call, index)? {
        Value::Number(n) => n.as_u64().map(Amount::from),
        Value::String(s) => amount::parse(s).ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ChainError::invalid_argument(&call.method, format!("argument {index} is not an amount"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn state_with_core() -> (SimState, Address) {
        let mut state = SimState::default();
        let core = state.deploy(addr(1), "Core", &[]);
        state
            .roles
            .entry(Role::governor())
            .or_default()
            .insert(addr(1));
        (state, core)
    }

    #[test]
    fn deploy_addresses_are_deterministic_and_distinct() {
        let mut a = SimState::default();
        let mut b = SimState::default();
        let first = a.deploy(addr(9), "Token", &[]);
        let second = a.deploy(addr(9), "Token", &[]);
        assert_ne!(first, second);
        assert_eq!(b.deploy(addr(9), "Token", &[]), first);
    }

    #[test]
    fn deploy_seeds_storage() {
        let mut state = SimState::default();
        let named = state.deploy(addr(1), "Wrapper", &[json!({ "target": "0x01" })]);
        let positional = state.deploy(addr(1), "Wrapper", &[json!(1), json!("x")]);
        assert_eq!(state.accounts[&named].storage["target"], json!("0x01"));
        assert_eq!(state.accounts[&positional].storage["arg1"], json!("x"));
    }

    #[test]
    fn role_methods_require_governor() {
        let (mut state, core) = state_with_core();
        let grant = ContractCall::new(core, "grantMinter", vec![json!(addr(5).to_string())]);

        let err = state.apply_call(addr(2), &grant).unwrap_err();
        assert!(err.is_revert());

        state.apply_call(addr(1), &grant).unwrap();
        assert!(state.has_role(Role::MINTER, addr(5)));

        let revoke = ContractCall::new(
            core,
            "revokeRole",
            vec![json!(Role::MINTER), json!(addr(5).to_string())],
        );
        state.apply_call(addr(1), &revoke).unwrap();
        assert!(!state.has_role(Role::MINTER, addr(5)));
    }

    #[test]
    fn paused_token_rejects_transfers() {
        let (mut state, _) = state_with_core();
        let token = state.deploy(addr(1), "Token", &[]);
        state.tokens.insert((token, addr(3)), 100);

        state
            .apply_call(addr(1), &ContractCall::new(token, "pause", vec![]))
            .unwrap();
        let transfer = ContractCall::new(token, "transfer", vec![json!(addr(4).to_string()), json!(10)]);
        assert_eq!(
            state.apply_call(addr(3), &transfer).unwrap_err(),
            ChainError::reverted("Pausable: paused")
        );

        state
            .apply_call(addr(1), &ContractCall::new(token, "unpause", vec![]))
            .unwrap();
        state.apply_call(addr(3), &transfer).unwrap();
        assert_eq!(state.tokens[&(token, addr(4))], 10);
        assert_eq!(state.tokens[&(token, addr(3))], 90);
    }

    #[test]
    fn calls_to_empty_addresses_fail() {
        let mut state = SimState::default();
        let call = ContractCall::new(addr(77), "pause", vec![]);
        assert_eq!(
            state.apply_call(addr(1), &call).unwrap_err(),
            ChainError::NoCode(addr(77))
        );
    }

    #[test]
    fn unknown_methods_revert() {
        let (mut state, core) = state_with_core();
        let err = state
            .apply_call(addr(1), &ContractCall::new(core, "selfDestruct", vec![]))
            .unwrap_err();
        assert_eq!(err, ChainError::reverted("unknown method selfDestruct"));
    }
}
