//! Built-in service definitions.
//!
//! Presets carry the image, ports, environment and container command that a
//! stock single-node deployment of each service needs. A service entry can
//! override any of them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confluent Platform release used by the Kafka-family presets.
pub const CONFLUENT_VERSION: &str = "7.0.1";

/// Default PostgreSQL image.
pub const POSTGRES_IMAGE: &str = "postgres:14.3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    Zookeeper,
    Kafka,
    SchemaRegistry,
    Postgres,
}

/// Values a preset contributes to a service definition.
#[derive(Debug, Clone)]
pub struct PresetDefaults {
    pub image: String,
    pub ports: Vec<&'static str>,
    pub environment: Vec<(&'static str, &'static str)>,
    pub command: Vec<&'static str>,
}

impl Preset {
    pub fn all() -> [Preset; 4] {
        [
            Preset::Zookeeper,
            Preset::Kafka,
            Preset::SchemaRegistry,
            Preset::Postgres,
        ]
    }

    pub fn defaults(&self) -> PresetDefaults {
        match self {
            Preset::Zookeeper => PresetDefaults {
                image: format!("confluentinc/cp-zookeeper:{}", CONFLUENT_VERSION),
                ports: vec!["2181"],
                environment: vec![("ZOOKEEPER_CLIENT_PORT", "2181")],
                command: vec![],
            },
            Preset::Kafka => PresetDefaults {
                image: format!("confluentinc/cp-kafka:{}", CONFLUENT_VERSION),
                ports: vec!["9092"],
                environment: vec![
                    ("KAFKA_ZOOKEEPER_CONNECT", "zookeeper:2181"),
                    ("KAFKA_CONFLUENT_SUPPORT_METRICS_ENABLE", "false"),
                    ("KAFKA_BROKER_ID", "1"),
                    ("KAFKA_MIN_INSYNC_REPLICAS", "1"),
                    ("KAFKA_OFFSETS_TOPIC_NUM_PARTITIONS", "1"),
                    ("KAFKA_OFFSETS_TOPIC_REPLICATION_FACTOR", "1"),
                    ("KAFKA_TRANSACTION_STATE_LOG_MIN_ISR", "1"),
                    ("KAFKA_TRANSACTION_STATE_LOG_REPLICATION_FACTOR", "1"),
                    ("KAFKA_MESSAGE_MAX_BYTES", "15728640"),
                    ("KAFKA_REPLICA_FETCH_MAX_BYTES", "15728640"),
                    ("KAFKA_AUTO_CREATE_TOPICS_ENABLE", "false"),
                    ("KAFKA_ADVERTISED_LISTENERS", "PLAINTEXT://kafka:9092"),
                ],
                command: vec![],
            },
            Preset::SchemaRegistry => PresetDefaults {
                image: format!("confluentinc/cp-schema-registry:{}", CONFLUENT_VERSION),
                ports: vec!["8081"],
                environment: vec![
                    (
                        "SCHEMA_REGISTRY_KAFKASTORE_BOOTSTRAP_SERVERS",
                        "PLAINTEXT://kafka:9092",
                    ),
                    ("SCHEMA_REGISTRY_KAFKASTORE_TIMEOUT_MS", "10000"),
                    ("SCHEMA_REGISTRY_HOST_NAME", "localhost"),
                ],
                command: vec![],
            },
            Preset::Postgres => PresetDefaults {
                image: POSTGRES_IMAGE.to_string(),
                ports: vec!["5432"],
                environment: vec![
                    ("POSTGRESDB", "postgres"),
                    ("POSTGRES_PASSWORD", "postgres"),
                ],
                command: vec![
                    "postgres",
                    "-c",
                    "wal_level=logical",
                    "-c",
                    "max_wal_senders=20",
                    "-c",
                    "max_replication_slots=20",
                    "-c",
                    "max_connections=5000",
                ],
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Preset::Zookeeper => "zookeeper",
            Preset::Kafka => "kafka",
            Preset::SchemaRegistry => "schema-registry",
            Preset::Postgres => "postgres",
        };
        f.write_str(name)
    }
}
