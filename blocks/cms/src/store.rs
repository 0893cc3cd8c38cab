use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use studio_atoms::{ContentError, ContentResult};

pub type Item = HashMap<String, AttributeValue>;

pub fn string_attr(item: &Item, key: &str) -> Option<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

/// Insert `value` under `key` only when it is set
pub fn put_optional(item: &mut Item, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        item.insert(key.to_string(), AttributeValue::S(value.clone()));
    }
}

/// All items of one partition whose sort key starts with `sk_prefix`,
/// following pagination to the end
pub async fn query_prefix(
    client: &DynamoClient,
    table_name: &str,
    pk: &str,
    sk_prefix: &str,
) -> ContentResult<Vec<Item>> {
    let mut items = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let result = client
            .query()
            .table_name(table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
            .expression_attribute_values(":sk_prefix", AttributeValue::S(sk_prefix.to_string()))
            .set_exclusive_start_key(start_key.take())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    "DynamoDB query failed for {} in table {}: {:?}",
                    pk,
                    table_name,
                    e
                );
                ContentError::Store(e.to_string())
            })?;

        items.extend(result.items().iter().cloned());

        match result.last_evaluated_key() {
            Some(key) if !key.is_empty() => start_key = Some(key.clone()),
            _ => break,
        }
    }

    Ok(items)
}

pub async fn get_item(
    client: &DynamoClient,
    table_name: &str,
    pk: &str,
    sk: String,
) -> ContentResult<Option<Item>> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.to_string()))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| {
            tracing::error!("DynamoDB get_item failed for {}: {:?}", pk, e);
            ContentError::Store(e.to_string())
        })?;

    Ok(result.item().cloned())
}

pub async fn put_item(client: &DynamoClient, table_name: &str, item: Item) -> ContentResult<()> {
    client
        .put_item()
        .table_name(table_name)
        .set_item(Some(item))
        .send()
        .await
        .map_err(|e| {
            tracing::error!("DynamoDB put_item failed in table {}: {:?}", table_name, e);
            ContentError::Store(e.to_string())
        })?;
    Ok(())
}

pub async fn delete_item(
    client: &DynamoClient,
    table_name: &str,
    pk: &str,
    sk: String,
) -> ContentResult<()> {
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.to_string()))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| {
            tracing::error!("DynamoDB delete_item failed for {}: {:?}", pk, e);
            ContentError::Store(e.to_string())
        })?;
    Ok(())
}
