use crate::error::{LoanOpsError, Result};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::marker::PhantomData;

/// Reads typed records (repayments, loan applications, users) from a CSV source.
///
/// Wraps `csv::Reader`, trimming whitespace and tolerating ragged rows, and
/// yields one `Result<T>` per row so a bad row does not stop the load.
pub struct RecordReader<R: Read, T> {
    reader: csv::Reader<R>,
    _record: PhantomData<T>,
}

impl<R: Read, T: DeserializeOwned> RecordReader<R, T> {
    /// Creates a new `RecordReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self {
            reader,
            _record: PhantomData,
        }
    }

    /// Lazily deserializes the rows.
    pub fn records(self) -> impl Iterator<Item = Result<T>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LoanOpsError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loan::{LoanApplication, LoanStatus, Repayment, RepaymentStatus, Role, User};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reads_repayments() {
        let data = "id, loan_id, installment_number, due_date, amount, amount_paid, status, is_deleted\n\
            7f3c1f7e-5a0e-4f55-9a53-0d4b8c1e2a01, 2b1d7d6e-3f3a-4b1e-8c44-5e9f0a7b6c11, 1, 2026-10-18, 150.00, 0, pending, false\n\
            9a4e2c1b-6d5f-4e3a-8b2c-1f0e9d8c7b02, 2b1d7d6e-3f3a-4b1e-8c44-5e9f0a7b6c11, 2, 2026-11-18, 150.00, 0, upcoming, false";
        let reader = RecordReader::<_, Repayment>::new(data.as_bytes());
        let results: Vec<Result<Repayment>> = reader.records().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.installment_number, 1);
        assert_eq!(first.due_date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(first.amount.value(), dec!(150.00));
        assert_eq!(first.status, RepaymentStatus::Pending);
        assert_eq!(results[1].as_ref().unwrap().status, RepaymentStatus::Upcoming);
    }

    #[test]
    fn test_reads_loan_applications() {
        let data = "id,customer_id,principal,status,created_at,is_deleted\n\
            0c9b8a7d-1e2f-4a3b-9c4d-5e6f7a8b9c01,1a2b3c4d-5e6f-4a7b-8c9d-0e1f2a3b4c5d,5000,pending,2026-10-10T09:30:00Z,false";
        let loans: Vec<LoanApplication> = RecordReader::new(data.as_bytes())
            .records()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(loans[0].status, LoanStatus::Pending);
        assert_eq!(loans[0].principal.value(), dec!(5000));
    }

    #[test]
    fn test_reads_users() {
        let data = "id,username,email,role,is_active\n\
            5d4c3b2a-1f0e-4d9c-8b7a-6f5e4d3c2b1a,ops,ops@example.com,admin,true";
        let users: Vec<User> = RecordReader::new(data.as_bytes())
            .records()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(users[0].role, Role::Admin);
        assert!(users[0].is_active_admin());
    }

    #[test]
    fn test_malformed_row_is_an_error() {
        let data = "id, loan_id, installment_number, due_date, amount, amount_paid, status, is_deleted\n\
            not-a-uuid, 2b1d7d6e-3f3a-4b1e-8c44-5e9f0a7b6c11, 1, 2026-10-18, 150.00, 0, pending, false\n\
            9a4e2c1b-6d5f-4e3a-8b2c-1f0e9d8c7b02, 2b1d7d6e-3f3a-4b1e-8c44-5e9f0a7b6c11, 2, 2026-11-18, -5, 0, pending, false";
        let results: Vec<Result<Repayment>> = RecordReader::new(data.as_bytes()).records().collect();
        assert!(results[0].is_err());
        assert!(results[1].is_err());
    }
}
