pub use accounts::{Account, ID_NUMBER_LEN};
pub use commands::{DepositCmd, UserCmd, WithdrawCmd};
pub use error::{EngineError, ErrorKind};
pub use money::Money;
pub use ops::{Engine, EngineBuilder};
pub use password::{hash_password, verify_password};
pub use transactions::{Receipt, Transaction, TransactionKind};
pub use users::User;

mod accounts;
mod commands;
mod error;
mod money;
mod ops;
mod password;
mod transactions;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
