use mongodb::{Client, Collection, Database};
use std::error::Error;

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool tuning
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .split('/')
            .last()
            .and_then(|s| s.split('?').next())
            .unwrap_or("RecipeShare");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the service relies on. The unique compound indexes
    /// are load-bearing: duplicate follow/save/membership/rating writes fail
    /// with code 11000 and the handlers translate that into HTTP 409, so the
    /// storage layer is the single source of truth for edge uniqueness.
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let unique = IndexOptions::builder().unique(true).build();

        // users: user_id is the primary lookup key, email must be unique too
        let users = self.db.collection::<mongodb::bson::Document>("users");
        for keys in [doc! { "user_id": 1 }, doc! { "email": 1 }] {
            let index = IndexModel::builder()
                .keys(keys.clone())
                .options(unique.clone())
                .build();
            match users.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: users{}", keys),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        // recipes: owner listing and published-feed queries
        let recipes = self.db.collection::<mongodb::bson::Document>("recipes");
        for keys in [
            doc! { "user_id": 1 },
            doc! { "is_published": 1, "created_at": -1 },
        ] {
            let index = IndexModel::builder().keys(keys.clone()).build();
            match recipes.create_index(index).await {
                Ok(_) => log::info!("   ✅ Index created: recipes{}", keys),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        // Unique edges: one row per pair, duplicates rejected by the store
        let edge_indexes: [(&str, mongodb::bson::Document); 4] = [
            ("follows", doc! { "follower_id": 1, "following_id": 1 }),
            ("saved_recipes", doc! { "user_id": 1, "recipe_id": 1 }),
            ("ratings", doc! { "user_id": 1, "recipe_id": 1 }),
            ("collection_recipes", doc! { "collection_id": 1, "recipe_id": 1 }),
        ];
        for (name, keys) in edge_indexes {
            let collection = self.db.collection::<mongodb::bson::Document>(name);
            let index = IndexModel::builder()
                .keys(keys.clone())
                .options(unique.clone())
                .build();
            match collection.create_index(index).await {
                Ok(_) => log::info!("   ✅ Unique index created: {}{}", name, keys),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        // collections: owner listing
        let collections = self.db.collection::<mongodb::bson::Document>("collections");
        let index = IndexModel::builder().keys(doc! { "user_id": 1 }).build();
        match collections.create_index(index).await {
            Ok(_) => log::info!("   ✅ Index created: collections(user_id)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// True when a write failed because a unique index rejected a duplicate.
pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_err)) => write_err.code == 11000,
        ErrorKind::Command(command_err) => command_err.code == 11000,
        _ => false,
    }
}
