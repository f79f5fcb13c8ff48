use serde::Serialize;

use crate::db::{CollectionMemberRow, PolishListRow};
use crate::entities::{custom_collections, users};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl Pagination {
    #[must_use]
    pub const fn new(total: u64, limit: u64, offset: u64) -> Self {
        Self {
            total,
            page: offset / limit + 1,
            limit,
            pages: total.div_ceil(limit),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub provider: String,
    pub created_at: String,
}

impl From<users::Model> for UserDto {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            provider: user.provider,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthDto {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct PolishDto {
    pub id: i32,
    pub user_id: i32,
    pub brand_id: Option<i32>,
    pub name: String,
    pub color_hex: Option<String>,
    pub finish_type: String,
    pub collection_name: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub purchase_location: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
    pub is_favorite: bool,
    pub custom_tags: Vec<String>,
    pub bottle_image_url: Option<String>,
    pub swatch_image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub brand_name: Option<String>,
    pub brand_website: Option<String>,
    pub brand_logo: Option<String>,
    pub last_used_at: Option<String>,
    pub usage_count: i64,
}

impl From<PolishListRow> for PolishDto {
    fn from(row: PolishListRow) -> Self {
        let custom_tags = row
            .custom_tags
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        Self {
            id: row.id,
            user_id: row.user_id,
            brand_id: row.brand_id,
            name: row.name,
            color_hex: row.color_hex,
            finish_type: row.finish_type,
            collection_name: row.collection_name,
            purchase_date: row.purchase_date,
            purchase_price: row.purchase_price,
            purchase_location: row.purchase_location,
            notes: row.notes,
            rating: row.rating,
            is_favorite: row.is_favorite,
            custom_tags,
            bottle_image_url: row.bottle_image_url,
            swatch_image_url: row.swatch_image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            brand_name: row.brand_name,
            brand_website: row.brand_website,
            brand_logo: row.brand_logo,
            last_used_at: row.last_used_at,
            usage_count: row.usage_count.unwrap_or(0),
        }
    }
}

/// Collection detail: the collection row plus its member polishes.
#[derive(Debug, Serialize)]
pub struct CollectionDetailDto {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub polishes: Vec<CollectionMemberRow>,
}

impl CollectionDetailDto {
    #[must_use]
    pub fn new(collection: custom_collections::Model, polishes: Vec<CollectionMemberRow>) -> Self {
        Self {
            id: collection.id,
            user_id: collection.user_id,
            name: collection.name,
            description: collection.description,
            color: collection.color,
            created_at: collection.created_at,
            updated_at: collection.updated_at,
            polishes,
        }
    }
}

// Re-exported so handlers can return listing rows without conversion.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(5, 2, 2);
        assert_eq!(p.page, 2);
        assert_eq!(p.pages, 3);

        let empty = Pagination::new(0, 20, 0);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.pages, 0);

        let exact = Pagination::new(40, 20, 20);
        assert_eq!(exact.page, 2);
        assert_eq!(exact.pages, 2);
    }

    #[test]
    fn test_polish_dto_decodes_tags() {
        let row = PolishListRow {
            id: 1,
            user_id: 1,
            brand_id: None,
            name: "Ruby Red".to_string(),
            color_hex: Some("#9B111E".to_string()),
            finish_type: "cream".to_string(),
            collection_name: None,
            purchase_date: None,
            purchase_price: Some(12.5),
            purchase_location: None,
            notes: None,
            rating: None,
            is_favorite: false,
            custom_tags: Some(r#"["fall","work-safe"]"#.to_string()),
            bottle_image_url: None,
            swatch_image_url: None,
            created_at: String::new(),
            updated_at: String::new(),
            brand_name: None,
            brand_website: None,
            brand_logo: None,
            last_used_at: None,
            usage_count: None,
        };

        let dto = PolishDto::from(row);
        assert_eq!(dto.custom_tags, vec!["fall", "work-safe"]);
        assert_eq!(dto.usage_count, 0);
    }
}
