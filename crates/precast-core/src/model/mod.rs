pub mod bom;
pub mod element;
pub mod element_type;
pub mod inventory;

pub use bom::{BomLine, BomLineInput, BomRevisionLine};
pub use element::Element;
pub use element_type::ElementType;
pub use inventory::{AdjustmentLogEntry, InventoryBalance, InventoryTransaction, TransactionStatus};
