//! Banks and their accounts.

mod bank;
mod bank_account;

pub use bank::{Bank, BankCriteria, BankDraft, BankPatch};
pub use bank_account::{
    AccountKind, BankAccount, BankAccountCriteria, BankAccountDraft, BankAccountPatch,
};
