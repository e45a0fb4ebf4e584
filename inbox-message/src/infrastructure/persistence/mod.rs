pub mod memory;
pub mod mongo_client;
pub mod mongo_conversation_repo;
pub mod mongo_message_repo;
