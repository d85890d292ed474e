// Paygate - payment gateway integration and order admission
//
// This library wires the CardPay integration, order admission and settings
// loading of the billing gateway behind a single crate.

// Re-export the domain model
pub use paygate_core::*;

pub use paygate_cardpay as cardpay;
pub use paygate_config as config;
pub use paygate_log as log;
pub use paygate_orders as orders;

// Prelude for common imports
pub mod prelude {
    pub use crate::cardpay::{
        GatewayAuthClient,
        GatewayError,
        GatewayPaymentClient,
        NotificationEndpoint,
        NotificationOutcome,
        NotificationProcessor,
        TokenStore,
    };
    pub use crate::config::{GatewaySettings, SettingsLoader};
    pub use crate::orders::{AdmissionError, OrderProcessor, OrderRequest, OrderValidator};
    pub use crate::{
        Clock,
        Currency,
        GeoLookup,
        Money,
        Order,
        OrderStatus,
        Repository,
        SystemClock,
    };
}
