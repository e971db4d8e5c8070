// Topic modeling: LDA topic tables and a 2D projection for plotting.

pub mod lda;
pub mod projection;
pub mod table;

pub use lda::{fit_lda, LdaConfig, LdaFit, LdaModel, MAX_ITERATIONS};
pub use projection::{tsne, TsneConfig};
pub use table::{
    corpus_topic_table, fit_topics, project_topics, DocumentTopics, ProjectedPoint, TermWeight,
    TopicFit, TopicTerms,
};
