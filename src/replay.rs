// 🔁 Replay - apply a CSV batch of account operations
//
// Format (header required):
//   op,account,amount,destination
//   open,a@b.com,200,
//   withdraw,a@b.com,50.25,
//   transfer,a@b.com,10,c@d.com
//
// Rejected rows are recorded in the report and the batch keeps going.

use crate::entities::AccountRegistry;
use crate::error::{AccountError, RegistryError};
use crate::money::Money;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

// ============================================================================
// OPERATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Open,
    Deposit,
    Withdraw,
    Transfer,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Open => "open",
            OperationKind::Deposit => "deposit",
            OperationKind::Withdraw => "withdraw",
            OperationKind::Transfer => "transfer",
        }
    }
}

/// One CSV row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub op: OperationKind,

    /// Account the operation acts on (the source for transfers)
    pub account: String,

    pub amount: f64,

    /// Transfer target; empty or missing means absent
    #[serde(default)]
    pub destination: Option<String>,
}

impl Operation {
    /// Apply this operation to `registry`
    pub fn apply(&self, registry: &mut AccountRegistry) -> std::result::Result<(), RegistryError> {
        match self.op {
            OperationKind::Open => registry.open(self.account.clone(), self.amount).map(|_| ()),
            OperationKind::Deposit => registry.deposit(&self.account, self.amount),
            OperationKind::Withdraw => registry.withdraw(&self.account, self.amount),
            OperationKind::Transfer => match self.destination.as_deref() {
                Some(destination) => registry.transfer(&self.account, destination, self.amount),
                None => Err(AccountError::InvalidDestination.into()),
            },
        }
    }
}

/// Read operations from any CSV source
pub fn read_operations<R: Read>(reader: R) -> Result<Vec<Operation>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut operations = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        let operation: Operation = result
            .with_context(|| format!("Failed to deserialize operation on row {}", index + 1))?;
        operations.push(operation);
    }

    Ok(operations)
}

/// Read operations from a CSV file
pub fn load_operations(csv_path: &Path) -> Result<Vec<Operation>> {
    let file = File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    read_operations(file)
}

// ============================================================================
// REPLAY REPORT
// ============================================================================

/// Result of one row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// 1-based data row (header excluded)
    pub row: usize,
    pub op: OperationKind,
    pub account: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        self.error_kind.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub applied: usize,
    pub rejected: usize,
    pub outcomes: Vec<Outcome>,

    /// Final balance per identity
    pub balances: BTreeMap<String, Money>,
}

impl ReplayReport {
    pub fn summary(&self) -> String {
        format!(
            "{} operations: {} applied, {} rejected, {} accounts",
            self.outcomes.len(),
            self.applied,
            self.rejected,
            self.balances.len()
        )
    }

    pub fn rejections(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| !o.is_applied())
    }
}

/// Apply `operations` in order, recording every outcome
pub fn replay(registry: &mut AccountRegistry, operations: &[Operation]) -> ReplayReport {
    let mut outcomes = Vec::with_capacity(operations.len());

    for (index, operation) in operations.iter().enumerate() {
        let row = index + 1;
        let (error_kind, message) = match operation.apply(registry) {
            Ok(()) => (None, None),
            Err(err) => {
                debug!(row, op = operation.op.as_str(), kind = err.kind(), "row rejected");
                (Some(err.kind()), Some(err.to_string()))
            }
        };

        outcomes.push(Outcome {
            row,
            op: operation.op,
            account: operation.account.clone(),
            error_kind,
            message,
        });
    }

    let applied = outcomes.iter().filter(|o| o.is_applied()).count();
    let report = ReplayReport {
        applied,
        rejected: outcomes.len() - applied,
        outcomes,
        balances: registry.balances(),
    };

    info!("{}", report.summary());
    report
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
op,account,amount,destination
open,a@b.com,200,
open,c@d.com,20.50,
withdraw,a@b.com,100,
withdraw,a@b.com,300,
deposit,c@d.com,10.999,
transfer,a@b.com,25.25,c@d.com
transfer,a@b.com,1,
transfer,a@b.com,1,nobody@x.com
open,a@b.com,5,
";

    #[test]
    fn test_read_operations() {
        let operations = read_operations(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(operations.len(), 9);

        assert_eq!(operations[0].op, OperationKind::Open);
        assert_eq!(operations[0].account, "a@b.com");
        assert_eq!(operations[0].amount, 200.0);
        assert_eq!(operations[0].destination, None);

        assert_eq!(operations[5].destination.as_deref(), Some("c@d.com"));
    }

    #[test]
    fn test_read_operations_without_destination_column() {
        let csv = "op,account,amount\ndeposit,a@b.com,5\n";
        let operations = read_operations(Cursor::new(csv)).unwrap();
        assert_eq!(operations[0].op, OperationKind::Deposit);
        assert_eq!(operations[0].destination, None);
    }

    #[test]
    fn test_read_operations_rejects_unknown_op() {
        let csv = "op,account,amount,destination\nrefund,a@b.com,5,\n";
        let err = read_operations(Cursor::new(csv)).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_replay_records_each_outcome() {
        let operations = read_operations(Cursor::new(SAMPLE)).unwrap();
        let mut registry = AccountRegistry::new();

        let report = replay(&mut registry, &operations);

        assert_eq!(report.applied, 4);
        assert_eq!(report.rejected, 5);

        let kinds: Vec<Option<&str>> = report.outcomes.iter().map(|o| o.error_kind).collect();
        assert_eq!(
            kinds,
            vec![
                None,
                None,
                None,
                Some("insufficient_funds"),
                Some("invalid_amount"),
                None,
                Some("invalid_destination"),
                Some("invalid_destination"),
                Some("duplicate_identity"),
            ]
        );

        assert_eq!(report.balances["a@b.com"], Money::from_cents(7475));
        assert_eq!(report.balances["c@d.com"], Money::from_cents(4575));
    }

    #[test]
    fn test_replay_rejections_iterator() {
        let operations = read_operations(Cursor::new(SAMPLE)).unwrap();
        let report = replay(&mut AccountRegistry::new(), &operations);

        let rows: Vec<usize> = report.rejections().map(|o| o.row).collect();
        assert_eq!(rows, vec![4, 5, 7, 8, 9]);
        assert_eq!(report.summary(), "9 operations: 4 applied, 5 rejected, 2 accounts");
    }

    #[test]
    fn test_report_serializes_to_json() {
        let operations = vec![Operation {
            op: OperationKind::Open,
            account: "a@b.com".to_string(),
            amount: 1.5,
            destination: None,
        }];
        let report = replay(&mut AccountRegistry::new(), &operations);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["applied"], 1);
        assert_eq!(json["outcomes"][0]["op"], "open");
        assert!(json["outcomes"][0].get("error_kind").is_none());
        assert_eq!(json["balances"]["a@b.com"], 1.5);
    }

    #[test]
    fn test_load_operations_missing_file() {
        let err = load_operations(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open CSV file"));
    }
}
