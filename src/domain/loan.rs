use super::entity::{Auditable, EntityId, FieldMap, FieldValue};
use super::money::{Amount, Balance};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RepaymentStatus {
    Pending,
    Upcoming,
    Paid,
    Partial,
    Overdue,
}

impl RepaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepaymentStatus::Pending => "pending",
            RepaymentStatus::Upcoming => "upcoming",
            RepaymentStatus::Paid => "paid",
            RepaymentStatus::Partial => "partial",
            RepaymentStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for RepaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Disbursed,
    Closed,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Disbursed => "disbursed",
            LoanStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    LoanOfficer,
    Viewer,
}

/// A borrower.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Customer {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Customer {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            email: email.into(),
            phone: None,
        }
    }
}

impl Auditable for Customer {
    const ENTITY_TYPE: &'static str = "customer";
    const MODULE: Option<&'static str> = Some("crm");

    fn entity_id(&self) -> Option<EntityId> {
        Some(self.id.into())
    }

    fn fields(&self) -> FieldMap {
        FieldMap::from([
            ("full_name", self.full_name.clone().into()),
            ("email", self.email.clone().into()),
            ("phone", self.phone.clone().into()),
        ])
    }

    fn repr(&self) -> String {
        format!("{} <{}>", self.full_name, self.email)
    }
}

/// A loan application, from submission through to closure.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LoanApplication {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub principal: Amount,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl LoanApplication {
    pub fn new(customer_id: Uuid, principal: Amount) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            principal,
            status: LoanStatus::Pending,
            created_at: Utc::now(),
            is_deleted: false,
        }
    }
}

impl Auditable for LoanApplication {
    const ENTITY_TYPE: &'static str = "loan_application";
    const MODULE: Option<&'static str> = Some("lending");
    const COMPLIANCE_RELEVANT: bool = true;

    fn entity_id(&self) -> Option<EntityId> {
        Some(self.id.into())
    }

    fn fields(&self) -> FieldMap {
        FieldMap::from([
            ("customer", FieldValue::Reference(self.customer_id.into())),
            ("principal", self.principal.value().into()),
            ("status", self.status.as_str().into()),
            ("created_at", self.created_at.into()),
            ("is_deleted", self.is_deleted.into()),
        ])
    }

    fn repr(&self) -> String {
        format!("Loan {} ({}, {})", self.id, self.principal, self.status.as_str())
    }
}

/// One scheduled instalment of a loan.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Repayment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub amount: Amount,
    #[serde(default)]
    pub amount_paid: Balance,
    pub status: RepaymentStatus,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Repayment {
    pub fn new(loan_id: Uuid, installment_number: u32, due_date: NaiveDate, amount: Amount) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            installment_number,
            due_date,
            amount,
            amount_paid: Balance::ZERO,
            status: RepaymentStatus::Pending,
            is_deleted: false,
        }
    }

    /// Whole days between the due date and `today`; zero or negative when not yet due.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days()
    }
}

impl Auditable for Repayment {
    const ENTITY_TYPE: &'static str = "repayment";
    const MODULE: Option<&'static str> = Some("repayments");
    const COMPLIANCE_RELEVANT: bool = true;

    fn entity_id(&self) -> Option<EntityId> {
        Some(self.id.into())
    }

    fn fields(&self) -> FieldMap {
        FieldMap::from([
            ("loan", FieldValue::Reference(self.loan_id.into())),
            ("installment_number", self.installment_number.into()),
            ("due_date", self.due_date.into()),
            ("amount", self.amount.value().into()),
            ("amount_paid", self.amount_paid.0.into()),
            ("status", self.status.as_str().into()),
            ("is_deleted", self.is_deleted.into()),
        ])
    }

    fn repr(&self) -> String {
        format!(
            "Repayment #{} of loan {} due {}",
            self.installment_number, self.loan_id, self.due_date
        )
    }
}

/// A back-office user; active admins receive the reminder digest.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            role,
            is_active: true,
        }
    }

    pub fn is_active_admin(&self) -> bool {
        self.is_active && self.role == Role::Admin
    }
}
