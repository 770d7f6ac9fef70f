pub mod subscription;

pub use subscription::{
    DecodeError, SubscriptionRequest, SubscriptionResponse, SummaryQuery, SummaryResponse,
    ValidationError, SUBSCRIPTION_REQUEST_FIELDS,
};
