pub mod chat_role;
pub mod vector_index;
