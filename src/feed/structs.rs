use anyhow::anyhow;
use chrono::{offset::Utc, DateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// The author of a post, as the server describes them. Display fields only;
/// the feed store never owns or mutates author data.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AuthorRef {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// What kind of post this is. Exactly one kind per record, and the structured
/// payload for each kind lives inside its variant, so a renderer matching on
/// this enum can't forget a case or read a field that isn't there.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PostKind {
    Regular,
    Event { event: EventDetails },
    Job { job: JobDetails },
    Media { media_url: String },
    Donation { donation: DonationDetails },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventDetails {
    pub title: String,
    pub venue: Option<String>,
    pub starts_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobDetails {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub apply_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DonationDetails {
    pub campaign: String,
    pub goal_cents: i64,
    pub raised_cents: i64,
}

/// Engagement counters owned by the interaction handlers, not by the sync
/// routine. Carried through unchanged so a snapshot shows what the server sent.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Engagement {
    pub like_count: u32,
    pub comments: Vec<Comment>,
    pub saved: bool,
    pub share_count: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub author: AuthorRef,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A post as it sits in the feed store. The id is guaranteed present: every
/// record passes through [`RawPost::validate`] before insertion.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub author: AuthorRef,
    /// May be empty for media-only posts.
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub kind: PostKind,
    /// Display ordering hint only. The store never re-sorts by it.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub engagement: Engagement,
}

/// A post as it arrives off the wire, before the id has been checked. Without
/// this boundary an id-less record would never match the duplicate check and
/// could be inserted again on every redelivery.
#[derive(Deserialize, Clone, Debug)]
pub struct RawPost {
    pub id: Option<Uuid>,
    pub author: AuthorRef,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub kind: PostKind,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub engagement: Engagement,
}

impl RawPost {
    /// Reject records without a stable id before they can reach the store.
    pub fn validate(self) -> anyhow::Result<Post> {
        guard!(let Some(id) = self.id else {
            warn!(author = %self.author.id, "dropping post record with no id");
            return Err(anyhow!("post record from {} has no id", self.author.id));
        });
        Ok(Post {
            id,
            author: self.author,
            content: self.content,
            kind: self.kind,
            created_at: self.created_at,
            engagement: self.engagement,
        })
    }
}

/// The composer form body: what a user submits to create a post. The server
/// assigns the id and timestamps and echoes back the full record.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewPost {
    pub content: String,
    #[serde(flatten)]
    pub kind: PostKind,
}

/// A plain regular post for tests elsewhere in the crate.
#[cfg(test)]
pub fn post_fixture(id: Uuid, content: &str) -> Post {
    Post {
        id,
        author: AuthorRef {
            id: Uuid::new_v4(),
            name: "Ada".to_owned(),
            avatar_url: None,
        },
        content: content.to_owned(),
        kind: PostKind::Regular,
        created_at: Utc::now(),
        engagement: Engagement::default(),
    }
}

/// The same post as it would look on the wire, id not yet checked.
#[cfg(test)]
pub fn raw_fixture(id: Option<Uuid>, content: &str) -> RawPost {
    RawPost {
        id,
        author: AuthorRef {
            id: Uuid::new_v4(),
            name: "Ada".to_owned(),
            avatar_url: None,
        },
        content: content.to_owned(),
        kind: PostKind::Regular,
        created_at: Utc::now(),
        engagement: Engagement::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_as_tag() {
        let post = Post {
            kind: PostKind::Job {
                job: JobDetails {
                    title: "Site reliability engineer".to_owned(),
                    company: "Initech".to_owned(),
                    location: Some("Remote".to_owned()),
                    apply_url: None,
                },
            },
            ..post_fixture(Uuid::new_v4(), "We're hiring!")
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["kind"], "job");
        assert_eq!(json["job"]["company"], "Initech");

        let back: Post = serde_json::from_value(json).unwrap();
        assert_eq!(back, post);
    }

    #[test]
    fn test_validate_requires_id() {
        let json = serde_json::json!({
            "id": null,
            "author": { "id": Uuid::new_v4(), "name": "Eve", "avatar_url": null },
            "kind": "regular",
            "created_at": Utc::now(),
        });
        let raw: RawPost = serde_json::from_value(json).unwrap();
        assert!(raw.validate().is_err());
    }

    #[test]
    fn test_validate_keeps_fields() {
        let id = Uuid::new_v4();
        let json = serde_json::json!({
            "id": id,
            "author": { "id": Uuid::new_v4(), "name": "Eve", "avatar_url": null },
            "content": "hello",
            "kind": "media",
            "media_url": "https://cdn.example/pic.png",
            "created_at": Utc::now(),
            "engagement": { "like_count": 3, "comments": [], "saved": true, "share_count": 0 },
        });
        let raw: RawPost = serde_json::from_value(json).unwrap();
        let post = raw.validate().unwrap();
        assert_eq!(post.id, id);
        assert_eq!(
            post.kind,
            PostKind::Media {
                media_url: "https://cdn.example/pic.png".to_owned()
            }
        );
        assert_eq!(post.engagement.like_count, 3);
        assert!(post.engagement.saved);
    }
}
