//! External collaborators
//!
//! The engine consumes three outside services through narrow interfaces:
//! payment capture, shipment order creation, and advisory notifications.
//! HTTP implementations live next to the traits; mock implementations back
//! the dev environment and the test suites.

pub mod notify;
pub mod order_creation;
pub mod payment;

pub use notify::{NotificationService, ResourceVersions};
pub use order_creation::{HttpOrderCreation, MockOrderCreation, OrderCreationCollaborator};
pub use payment::{HttpPaymentGateway, MockPaymentGateway, PaymentCollaborator, PaymentOutcome};
