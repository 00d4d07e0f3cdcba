// Topic modelling — clusters described by class TF-IDF keywords.

pub mod ctfidf;
pub mod hierarchy;
pub mod model;
pub mod vectorizer;

pub use hierarchy::{hierarchical_topics, HierarchicalTopic, HierarchicalTopics};
pub use model::{Topic, TopicInfoRow, TopicModel, NOISE_TOPIC};
pub use vectorizer::CountVectorizer;
