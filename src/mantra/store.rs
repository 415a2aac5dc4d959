//! Mantra catalog store.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::persist;

const COLLECTION: &str = "mantras";

/// A catalog mantra. Not user-owned and never mutated after seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mantra {
    pub id: String,
    pub name: String,
    pub sanskrit: String,
    pub transliteration: String,
    pub description: String,
    pub audio_url: Option<String>,
    pub category: String,
    /// Nominal duration of one chanting round, in seconds.
    pub duration_seconds: u32,
    pub created_at: DateTime<Utc>,
}

/// Store for the mantra catalog.
#[derive(Clone)]
pub struct MantraStore {
    by_id: Arc<DashMap<String, Mantra>>,
    data_dir: Option<PathBuf>,
}

impl MantraStore {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        let by_id: Arc<DashMap<String, Mantra>> = Arc::new(DashMap::new());
        if let Some(ref dir) = data_dir {
            for (id, mantra) in persist::load_collection::<Mantra>(dir, COLLECTION) {
                by_id.insert(id, mantra);
            }
        }
        Self { by_id, data_dir }
    }

    /// Seed the default catalog when the collection is empty.
    /// Returns the number of mantras inserted.
    pub fn seed_if_empty(&self, now: DateTime<Utc>) -> usize {
        if !self.by_id.is_empty() {
            return 0;
        }

        for (position, seed) in default_catalog().into_iter().enumerate() {
            let mantra = Mantra {
                id: Uuid::new_v4().to_string(),
                name: seed.name.to_string(),
                sanskrit: seed.sanskrit.to_string(),
                transliteration: seed.transliteration.to_string(),
                description: seed.description.to_string(),
                audio_url: None,
                category: seed.category.to_string(),
                duration_seconds: seed.duration_seconds,
                // Staggered so creation order survives the sort in `list`.
                created_at: now + Duration::milliseconds(position as i64),
            };
            self.by_id.insert(mantra.id.clone(), mantra);
        }

        self.persist();
        self.by_id.len()
    }

    /// All mantras in creation order.
    pub fn list(&self) -> Vec<Mantra> {
        let mut mantras: Vec<Mantra> = self.by_id.iter().map(|e| e.value().clone()).collect();
        mantras.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        mantras
    }

    fn persist(&self) {
        if let Some(ref dir) = self.data_dir {
            let entries = self
                .by_id
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect();
            persist::save_collection(dir, COLLECTION, &entries);
        }
    }
}

struct SeedMantra {
    name: &'static str,
    sanskrit: &'static str,
    transliteration: &'static str,
    description: &'static str,
    category: &'static str,
    duration_seconds: u32,
}

fn default_catalog() -> Vec<SeedMantra> {
    vec![
        SeedMantra {
            name: "Hare Krishna Maha Mantra",
            sanskrit: "हरे कृष्ण हरे कृष्ण कृष्ण कृष्ण हरे हरे। हरे राम हरे राम राम राम हरे हरे॥",
            transliteration: "Hare Krishna Hare Krishna Krishna Krishna Hare Hare, Hare Rama Hare Rama Rama Rama Hare Hare",
            description: "The Maha Mantra is the great mantra of deliverance. It cleanses the heart and awakens dormant love for Krishna. Chanting these 16 names of the Lord brings immense spiritual benefits.",
            category: "Maha Mantra",
            duration_seconds: 108,
        },
        SeedMantra {
            name: "Krishna Gayatri Mantra",
            sanskrit: "ॐ देवकीनन्दनाय विद्महे वासुदेवाय धीमहि तन्नो कृष्णः प्रचोदयात्",
            transliteration: "Om Devkinandanaya Vidmahe Vasudevaya Dhimahi Tanno Krishna Prachodayat",
            description: "This Gayatri mantra dedicated to Lord Krishna helps in meditation and spiritual advancement. It invokes the divine qualities of Krishna.",
            category: "Gayatri",
            duration_seconds: 45,
        },
        SeedMantra {
            name: "Radha Krishna Mantra",
            sanskrit: "ॐ श्रीं राधा कृष्णाभ्यां नमः",
            transliteration: "Om Shreem Radha Krishnabhyam Namah",
            description: "This mantra invokes the divine couple Radha and Krishna. It brings love, devotion, and harmonious relationships into life.",
            category: "Prayer",
            duration_seconds: 30,
        },
        SeedMantra {
            name: "Krishna Moola Mantra",
            sanskrit: "ॐ क्लीं कृष्णाय नमः",
            transliteration: "Om Kleem Krishnaya Namah",
            description: "The seed mantra of Lord Krishna. It is powerful for attracting divine grace, removing obstacles, and achieving success in spiritual and material endeavors.",
            category: "Beej Mantra",
            duration_seconds: 20,
        },
        SeedMantra {
            name: "Gopal Mantra",
            sanskrit: "ॐ श्री गोपालाय नमः",
            transliteration: "Om Shri Gopalaya Namah",
            description: "This mantra honors Krishna as the divine cowherd. Chanting it brings peace, protection, and the blessings of Lord Gopal.",
            category: "Prayer",
            duration_seconds: 25,
        },
    ]
}
