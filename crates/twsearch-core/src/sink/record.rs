//! Flattened per-tweet output record

use serde_json::{json, Value};

use crate::dates;
use crate::sink::tokenize::Tokenizer;
use crate::types::{SearchMetadata, Tweet};
use crate::Result;

/// CSV column order
pub const CSV_COLUMNS: [&str; 14] = [
    "created_at_exceltime",
    "created_at_epoch",
    "created_at",
    "created_at_jst",
    "text",
    "extended_text",
    "hashtags",
    "id",
    "userId",
    "name",
    "screen_name",
    "fixlink",
    "wakati_text",
    "wakati_extended_text",
];

/// Everything a sink derives from one tweet
#[derive(Debug, Clone, PartialEq)]
pub struct TweetRecord {
    pub created_at_exceltime: f64,
    pub created_at_epoch: i64,
    pub created_at: String,
    pub created_at_jst: String,
    pub text: String,
    pub extended_text: String,
    pub hashtags: Vec<String>,
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub screen_name: String,
    pub fixlink: String,
    /// Present only when a tokenizer was supplied
    pub wakati: Option<Wakati>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wakati {
    pub text: String,
    pub extended_text: String,
}

impl TweetRecord {
    pub fn from_tweet(tweet: &Tweet, tokenizer: Option<&dyn Tokenizer>) -> Result<Self> {
        let created_at = tweet.created_at().unwrap_or_default();
        let created = dates::parse_created_at(created_at)?;
        let text = tweet.text().to_string();
        let extended_text = tweet.extended_text().unwrap_or_default().to_string();
        let wakati = tokenizer.map(|t| Wakati {
            text: t.tokenize(&text),
            extended_text: t.tokenize(&extended_text),
        });
        let user_id = match tweet.user_id_str() {
            Some(id) => id.to_string(),
            None => tweet.user_id().map(|id| id.to_string()).unwrap_or_default(),
        };

        Ok(Self {
            created_at_exceltime: dates::to_excel_serial(&created),
            created_at_epoch: dates::to_epoch(&created),
            created_at: created_at.to_string(),
            created_at_jst: dates::to_jst_string(&created),
            text,
            extended_text,
            hashtags: tweet.hashtags().into_iter().map(str::to_string).collect(),
            id: tweet.id_str().unwrap_or_default(),
            user_id,
            name: tweet.user_name().unwrap_or_default().to_string(),
            screen_name: tweet.screen_name().unwrap_or_default().to_string(),
            fixlink: tweet.permalink().unwrap_or_default(),
            wakati,
        })
    }

    /// Field values in [`CSV_COLUMNS`] order
    pub fn csv_fields(&self) -> [String; 14] {
        let (wakati_text, wakati_extended_text) = match &self.wakati {
            Some(w) => (w.text.clone(), w.extended_text.clone()),
            None => (String::new(), String::new()),
        };
        [
            self.created_at_exceltime.to_string(),
            self.created_at_epoch.to_string(),
            self.created_at.clone(),
            self.created_at_jst.clone(),
            self.text.clone(),
            self.extended_text.clone(),
            self.hashtags.join(","),
            self.id.clone(),
            self.user_id.clone(),
            self.name.clone(),
            self.screen_name.clone(),
            self.fixlink.clone(),
            wakati_text,
            wakati_extended_text,
        ]
    }

    /// JSON document wrapping the raw tweet
    pub fn to_json(&self, tweet: &Tweet, metadata: &SearchMetadata) -> Result<Value> {
        let mut record = json!({
            "created_time": self.created_at_epoch,
            "base": {
                "created_at": self.created_at,
                "created_at_exceltime": self.created_at_exceltime,
                "created_at_epoch": self.created_at_epoch,
                "created_at_jst": self.created_at_jst,
            },
            "tweet": tweet.as_value(),
            "search_metadata": serde_json::to_value(metadata)?,
        });
        if let (Some(wakati), Some(object)) = (&self.wakati, record.as_object_mut()) {
            object.insert(
                "wakati".to_string(),
                json!({"text": wakati.text, "extended_text": wakati.extended_text}),
            );
        }
        Ok(record)
    }
}
