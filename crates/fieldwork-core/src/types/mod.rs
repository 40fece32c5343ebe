pub mod address;
pub mod document;
pub mod link;
pub mod option;
pub mod role;
pub mod territory;
pub mod unit;

pub use address::{Address, AddressProgress, AddressType};
pub use document::{DocRef, Document, DocumentData};
pub use link::{LinkSession, LinkType};
pub use option::HouseholdTypeOption;
pub use role::Role;
pub use territory::Territory;
pub use unit::{parse_int_prefix, Unit, UnitStatus};
