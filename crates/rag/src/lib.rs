//! Agentic RAG pipeline: guardrails, query preparation, hybrid retrieval,
//! reranking, grading, the bounded rewrite loop, context expansion and
//! packing, and generation. [`pipeline::build_pipeline`] wires all of it
//! onto the generic workflow engine from `hr-rag-workflow`.

pub mod context_expander;
pub mod context_packer;
pub mod embedding_client;
pub mod error;
pub mod generator;
pub mod grader;
pub mod guardrails;
pub mod intent;
pub mod metrics;
pub mod pipeline;
pub mod prompt_factory;
pub mod query_prep;
pub mod rerank;
pub mod reranker_client;
pub mod retriever;
pub mod rewriter;
pub mod rrf;
pub mod validator;
pub mod vector_store;

pub use embedding_client::HttpEmbeddingClient;
pub use error::RagError;
pub use pipeline::{build_pipeline, run_turn, PipelineDeps};
pub use reranker_client::HttpRerankerClient;
pub use vector_store::QdrantVectorStore;
