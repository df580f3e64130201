//! Products Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use mockall::automock;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query_as};

use crate::products::{NewProduct, Product, ProductId, ProductsError};

const INSERT_PRODUCT_SQL: &str = include_str!("sql/insert_product.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");

#[automock]
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, ProductsError>;

    async fn get_product(&self, id: ProductId) -> Result<Product, ProductsError>;
}

#[derive(Debug, Clone)]
pub struct PgProductsRepository {
    pool: PgPool,
}

impl PgProductsRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductsRepository for PgProductsRepository {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, ProductsError> {
        query_as::<Postgres, Product>(INSERT_PRODUCT_SQL)
            .bind(product.title)
            .bind(i64::try_from(product.price)?)
            .fetch_one(&self.pool)
            .await
            .map_err(ProductsError::from)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, ProductsError> {
        query_as::<Postgres, Product>(GET_PRODUCT_SQL)
            .bind(id.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(ProductsError::from)
    }
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let price_i64: i64 = row.try_get("price")?;

        let price = u64::try_from(price_i64).map_err(|e| sqlx::Error::ColumnDecode {
            index: "price".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: row.try_get::<i64, _>("id")?.into(),
            title: row.try_get("title")?,
            price,
            version: row.try_get("version")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
