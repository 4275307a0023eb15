//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use pixelift_core::{
    Image, ImageDetails, ImageId, Transaction, TransactionId, TransformationConfig,
    TransformationKind, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes first-sight user creation so concurrent resolves of the
    /// same subject cannot create duplicate records.
    user_create_lock: std::sync::Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            user_create_lock: std::sync::Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_cf_value<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Resolve an index entry (stored as raw UUID bytes) to a user.
    fn user_from_index(&self, cf_name: &str, key: &[u8]) -> Result<Option<User>> {
        let cf = self.cf(cf_name)?;
        let Some(id_bytes) = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut bytes = [0u8; 16];
        if id_bytes.len() != 16 {
            return Err(StoreError::Database("corrupt user index entry".into()));
        }
        bytes.copy_from_slice(&id_bytes);
        self.get_user(&UserId::from_bytes(bytes))
    }

    /// Collect index keys under `prefix`, newest first, applying pagination.
    fn paged_index_keys(
        &self,
        cf_name: &str,
        prefix: &[u8],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(prefix, rocksdb::Direction::Forward),
        );

        // ULID suffixes are time-ordered, so collecting forward and reversing
        // yields newest-first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        Ok(all_keys.into_iter().skip(offset).take(limit).collect())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn put_user(&self, user: &User) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let cf_subject = self.cf(cf::USERS_BY_SUBJECT)?;
        let cf_email = self.cf(cf::USERS_BY_EMAIL)?;

        let key = keys::user_key(&user.id);
        let value = Self::serialize(user)?;

        let mut batch = WriteBatch::default();

        // Drop stale index entries when subject or email changed.
        if let Some(previous) = self.get_user(&user.id)? {
            if previous.subject != user.subject {
                batch.delete_cf(&cf_subject, keys::subject_key(&previous.subject));
            }
            if !previous.email.is_empty() && !previous.email.eq_ignore_ascii_case(&user.email) {
                batch.delete_cf(&cf_email, keys::email_key(&previous.email));
            }
        }

        batch.put_cf(&cf_users, &key, &value);
        batch.put_cf(&cf_subject, keys::subject_key(&user.subject), &key);
        // Subjects are always present; emails may not be reported by the
        // identity provider.
        if !user.email.is_empty() {
            batch.put_cf(&cf_email, keys::email_key(&user.email), &key);
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        self.get_cf_value(cf::USERS, &keys::user_key(user_id))
    }

    fn get_user_by_subject(&self, subject: &str) -> Result<Option<User>> {
        self.user_from_index(cf::USERS_BY_SUBJECT, &keys::subject_key(subject))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        if email.is_empty() {
            return Ok(None);
        }
        self.user_from_index(cf::USERS_BY_EMAIL, &keys::email_key(email))
    }

    fn delete_user(&self, user_id: &UserId) -> Result<User> {
        let user = self.get_user(user_id)?.ok_or_else(StoreError::user_not_found)?;

        let cf_users = self.cf(cf::USERS)?;
        let cf_subject = self.cf(cf::USERS_BY_SUBJECT)?;
        let cf_email = self.cf(cf::USERS_BY_EMAIL)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_users, keys::user_key(user_id));
        batch.delete_cf(&cf_subject, keys::subject_key(&user.subject));
        if !user.email.is_empty() {
            batch.delete_cf(&cf_email, keys::email_key(&user.email));
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(user)
    }

    fn create_user_if_absent(&self, candidate: &User) -> Result<User> {
        let _guard = self
            .user_create_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(existing) = self.get_user_by_subject(&candidate.subject)? {
            return Ok(existing);
        }

        // Link a record created through another channel, matched by email.
        if !candidate.email.is_empty() {
            if let Some(mut existing) = self.get_user_by_email(&candidate.email)? {
                existing.subject = candidate.subject.clone();
                existing.updated_at = chrono::Utc::now();
                self.put_user(&existing)?;
                return Ok(existing);
            }
        }

        self.put_user(candidate)?;
        Ok(candidate.clone())
    }

    fn adjust_credits(&self, user_id: &UserId, delta: i64) -> Result<i64> {
        let cf_users = self.cf(cf::USERS)?;

        let mut user = self.get_user(user_id)?.ok_or_else(StoreError::user_not_found)?;

        let new_balance = user.credit_balance + delta;
        if new_balance < 0 {
            return Err(StoreError::InsufficientCredits {
                balance: user.credit_balance,
                required: -delta,
            });
        }

        user.credit_balance = new_balance;
        user.updated_at = chrono::Utc::now();

        let value = Self::serialize(&user)?;
        self.db
            .put_cf(&cf_users, keys::user_key(user_id), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(new_balance)
    }

    // =========================================================================
    // Image Operations
    // =========================================================================

    fn put_image(&self, image: &Image) -> Result<()> {
        let cf_images = self.cf(cf::IMAGES)?;
        let cf_by_user = self.cf(cf::IMAGES_BY_USER)?;

        let image_key = keys::image_key(&image.id);
        let user_image_key = keys::user_image_key(&image.author, &image.id);
        let value = Self::serialize(image)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_images, &image_key, &value);
        batch.put_cf(&cf_by_user, &user_image_key, []); // Index entry (empty value)

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_image(&self, image_id: &ImageId) -> Result<Option<Image>> {
        self.get_cf_value(cf::IMAGES, &keys::image_key(image_id))
    }

    fn update_image(
        &self,
        image_id: &ImageId,
        owner: &UserId,
        transformation_type: TransformationKind,
        details: ImageDetails,
    ) -> Result<Image> {
        let cf_images = self.cf(cf::IMAGES)?;

        let mut image = self
            .get_image(image_id)?
            .ok_or_else(StoreError::image_not_found)?;

        if image.author != *owner {
            return Err(StoreError::NotOwner);
        }

        image.apply_update(transformation_type, details);

        let value = Self::serialize(&image)?;
        self.db
            .put_cf(&cf_images, keys::image_key(image_id), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(image)
    }

    fn delete_image(&self, image_id: &ImageId, owner: &UserId) -> Result<()> {
        let image = self
            .get_image(image_id)?
            .ok_or_else(StoreError::image_not_found)?;

        if image.author != *owner {
            return Err(StoreError::NotOwner);
        }

        let cf_images = self.cf(cf::IMAGES)?;
        let cf_by_user = self.cf(cf::IMAGES_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_images, keys::image_key(image_id));
        batch.delete_cf(&cf_by_user, keys::user_image_key(owner, image_id));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_images_by_user(
        &self,
        owner: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Image>> {
        let prefix = keys::user_images_prefix(owner);
        let index_keys = self.paged_index_keys(cf::IMAGES_BY_USER, &prefix, limit, offset)?;

        let mut images = Vec::with_capacity(index_keys.len());
        for key in index_keys {
            let image_id = keys::extract_image_id_from_user_key(&key);
            if let Some(image) = self.get_image(&image_id)? {
                images.push(image);
            }
        }

        Ok(images)
    }

    fn list_images(&self, limit: usize, offset: usize) -> Result<Vec<Image>> {
        let cf_images = self.cf(cf::IMAGES)?;

        // Primary keys are ULIDs, so reverse iteration is newest-first.
        let iter = self.db.iterator_cf(&cf_images, IteratorMode::End);

        let mut images = Vec::new();
        for item in iter.skip(offset) {
            if images.len() >= limit {
                break;
            }
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            images.push(Self::deserialize(&value)?);
        }

        Ok(images)
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transaction>> {
        self.get_cf_value(cf::TRANSACTIONS, &keys::transaction_key(transaction_id))
    }

    fn get_transaction_by_stripe_id(&self, stripe_id: &str) -> Result<Option<Transaction>> {
        let cf_stripe = self.cf(cf::TRANSACTIONS_BY_STRIPE)?;
        let Some(id_bytes) = self
            .db
            .get_cf(&cf_stripe, keys::stripe_key(stripe_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut bytes = [0u8; 16];
        if id_bytes.len() != 16 {
            return Err(StoreError::Database("corrupt transaction index entry".into()));
        }
        bytes.copy_from_slice(&id_bytes);
        let tx_id = TransactionId::from_bytes(bytes)
            .map_err(|_| StoreError::Database("corrupt transaction index entry".into()))?;
        self.get_transaction(&tx_id)
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        let prefix = keys::user_transactions_prefix(user_id);
        let index_keys = self.paged_index_keys(cf::TRANSACTIONS_BY_USER, &prefix, limit, offset)?;

        let mut transactions = Vec::with_capacity(index_keys.len());
        for key in index_keys {
            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn record_purchase(&self, transaction: &Transaction) -> Result<i64> {
        // Idempotency: one record per external payment id.
        if self
            .get_transaction_by_stripe_id(&transaction.stripe_id)?
            .is_some()
        {
            return Err(StoreError::DuplicateTransaction {
                stripe_id: transaction.stripe_id.clone(),
            });
        }

        let mut buyer = self
            .get_user(&transaction.buyer)?
            .ok_or_else(StoreError::user_not_found)?;

        buyer.credit_balance += transaction.credits;
        buyer.updated_at = chrono::Utc::now();

        let cf_users = self.cf(cf::USERS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_stripe = self.cf(cf::TRANSACTIONS_BY_STRIPE)?;
        let cf_tx_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let tx_key = keys::transaction_key(&transaction.id);
        let user_value = Self::serialize(&buyer)?;
        let tx_value = Self::serialize(transaction)?;

        // Write atomically: the payment record and the credit grant stand or
        // fall together.
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(&transaction.buyer), &user_value);
        batch.put_cf(&cf_tx, &tx_key, &tx_value);
        batch.put_cf(&cf_stripe, keys::stripe_key(&transaction.stripe_id), &tx_key);
        batch.put_cf(
            &cf_tx_by_user,
            keys::user_transaction_key(&transaction.buyer, &transaction.id),
            [],
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(buyer.credit_balance)
    }

    fn apply_transformation(
        &self,
        image_id: &ImageId,
        owner: &UserId,
        config: &TransformationConfig,
        fee: i64,
    ) -> Result<i64> {
        let mut image = self
            .get_image(image_id)?
            .ok_or_else(StoreError::image_not_found)?;

        if image.author != *owner {
            return Err(StoreError::NotOwner);
        }

        let mut user = self.get_user(owner)?.ok_or_else(StoreError::user_not_found)?;

        if user.credit_balance < fee {
            return Err(StoreError::InsufficientCredits {
                balance: user.credit_balance,
                required: fee,
            });
        }

        user.credit_balance -= fee;
        user.updated_at = chrono::Utc::now();

        image.details.config = config.clone();
        image.updated_at = chrono::Utc::now();

        let cf_users = self.cf(cf::USERS)?;
        let cf_images = self.cf(cf::IMAGES)?;

        let user_value = Self::serialize(&user)?;
        let image_value = Self::serialize(&image)?;

        // Debit and merge commit together.
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(owner), &user_value);
        batch.put_cf(&cf_images, keys::image_key(image_id), &image_value);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(user.credit_balance)
    }
}
