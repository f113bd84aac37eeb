//! Contract interface document served by a Stacks node at
//! `/v2/contracts/interface/{address}/{contract}`.

use crate::types::TypeDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionAccess {
    Public,
    ReadOnly,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiFunctionArg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiOutput {
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiFunction {
    pub name: String,
    pub access: FunctionAccess,
    #[serde(default)]
    pub args: Vec<AbiFunctionArg>,
    pub outputs: AbiOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableAccess {
    Variable,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub access: VariableAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiMap {
    pub name: String,
    pub key: TypeDescriptor,
    pub value: TypeDescriptor,
}

/// Only the members the codec needs; token and epoch metadata are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInterface {
    #[serde(default)]
    pub functions: Vec<AbiFunction>,
    #[serde(default)]
    pub variables: Vec<AbiVariable>,
    #[serde(default)]
    pub maps: Vec<AbiMap>,
}

impl ContractInterface {
    pub fn find_function(&self, name: &str) -> Option<&AbiFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn find_variable(&self, name: &str) -> Option<&AbiVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn find_map(&self, name: &str) -> Option<&AbiMap> {
        self.maps.iter().find(|m| m.name == name)
    }

    /// Functions callable without a transaction.
    pub fn read_only_functions(&self) -> impl Iterator<Item = &AbiFunction> {
        self.functions
            .iter()
            .filter(|f| f.access == FunctionAccess::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interface() -> ContractInterface {
        serde_json::from_value(json!({
            "functions": [
                {
                    "name": "get-balance",
                    "access": "read_only",
                    "args": [ { "name": "who", "type": "principal" } ],
                    "outputs": { "type": { "response": { "ok": "uint128", "error": "none" } } }
                },
                {
                    "name": "transfer",
                    "access": "public",
                    "args": [
                        { "name": "amount", "type": "uint128" },
                        { "name": "to", "type": "principal" }
                    ],
                    "outputs": { "type": { "response": { "ok": "bool", "error": "uint128" } } }
                }
            ],
            "variables": [
                { "name": "paused", "type": "bool", "access": "variable" }
            ],
            "maps": [
                { "name": "balances", "key": "principal", "value": "uint128" }
            ],
            "fungible_tokens": [ { "name": "token" } ],
            "non_fungible_tokens": [],
            "epoch": "Epoch21",
            "clarity_version": "Clarity2"
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_interface() {
        let abi = interface();
        assert_eq!(abi.functions.len(), 2);
        assert_eq!(abi.find_function("transfer").unwrap().args.len(), 2);
        assert_eq!(abi.find_variable("paused").unwrap().ty, TypeDescriptor::Bool);
        assert_eq!(abi.find_map("balances").unwrap().key, TypeDescriptor::Principal);
        assert!(abi.find_map("missing").is_none());
    }

    #[test]
    fn test_read_only_filter() {
        let abi = interface();
        let names: Vec<_> = abi.read_only_functions().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["get-balance"]);
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let abi: ContractInterface = serde_json::from_value(json!({})).unwrap();
        assert_eq!(abi, ContractInterface::default());
    }
}
