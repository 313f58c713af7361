use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{flexible_timestamp, Resource, ResourceService};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(alias = "Id", alias = "blogId", alias = "BlogId", alias = "blog_id")]
    pub id: i64,

    #[serde(alias = "Title")]
    pub title: String,

    /// Rich-text body as produced by the editor (HTML).
    #[serde(default, alias = "Content", alias = "body", alias = "Body")]
    pub content: String,

    #[serde(default, alias = "Author", alias = "authorName", alias = "AuthorName")]
    pub author: Option<String>,

    #[serde(default, alias = "CoverImage", alias = "cover_image", alias = "imageUrl", alias = "ImageUrl")]
    pub cover_image: Option<String>,

    #[serde(default, alias = "Tags")]
    pub tags: Vec<String>,

    #[serde(
        default,
        alias = "CreatedAt",
        alias = "created_at",
        alias = "publishedAt",
        alias = "PublishedAt",
        deserialize_with = "flexible_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDraft {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

pub struct Blogs;

impl Resource for Blogs {
    const PATH: &'static str = "/api/blogs";
    type Model = Blog;
    type Draft = BlogDraft;
}

pub type BlogService = ResourceService<Blogs>;
