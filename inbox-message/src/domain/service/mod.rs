pub mod message_domain_service;
pub use message_domain_service::MessageDomainService;
