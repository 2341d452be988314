pub use registra_models::terms::{CreditPolicy, Term, UpsertCreditPolicyDto};
