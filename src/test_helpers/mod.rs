// Test Helpers Module - In-Process Test Infrastructure
//
// Builders, an in-memory repository and scripted stand-ins for the rendering,
// delivery, token and URL services. Everything here runs without a database or
// network, so pipeline tests can drive whole runs and inspect every write.

pub mod builders;
pub mod in_memory_repository;
pub mod scripted_clients;

pub use builders::{test_config, OrderItemBuilder};
pub use in_memory_repository::InMemoryOrderRepository;
pub use scripted_clients::{
    document_url_for, DeliveryRecord, RecordingSink, ScriptedDeliveryClient,
    ScriptedRenderClient, ScriptedTokenExchange, ScriptedUrlProbe,
};
