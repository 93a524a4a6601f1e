// Catalog tables, written by the ETL jobs
pub mod equipment;
pub mod part;
pub mod power_unit;

// Lead capture and estimator history
pub mod contact_inquiry;
pub mod project_estimate;
pub mod quote_request;

// Portal-only records keyed by session subject
pub mod customer_order;
pub mod customer_payment;

pub use contact_inquiry::{
    Entity as ContactInquiryEntity, Model as ContactInquiry,
};
pub use customer_order::{Entity as CustomerOrderEntity, Model as CustomerOrder};
pub use customer_payment::{Entity as CustomerPaymentEntity, Model as CustomerPayment};
pub use equipment::{Entity as EquipmentEntity, Model as Equipment};
pub use part::{Entity as PartEntity, Model as Part};
pub use power_unit::{Entity as PowerUnitEntity, Model as PowerUnit};
pub use project_estimate::{Entity as ProjectEstimateEntity, Model as ProjectEstimate};
pub use quote_request::{Entity as QuoteRequestEntity, Model as QuoteRequest};
