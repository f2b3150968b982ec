//! Block blob walkthrough: stage, inspect, commit.

use bytes::Bytes;

use crate::config::BlockSettings;
use crate::context::WorkflowContext;
use crate::error::{SampleError, SampleResult};
use crate::events::WorkflowEvent;
use crate::models::{BlobType, BlockList, BlockListType, BlockRef, BlockState};

use super::download::download_blob;
use super::verify_content;

/// Creates an empty block blob with no committed blocks.
pub async fn create_block_blob(ctx: &WorkflowContext<'_>, blob: &str) -> SampleResult<()> {
    ctx.store
        .create_block_blob(&ctx.container, blob)
        .await
        .map_err(|e| SampleError::create(blob, e))?;

    ctx.emit(WorkflowEvent::BlobCreated {
        container: ctx.container.clone(),
        blob: blob.to_string(),
        kind: BlobType::BlockBlob.as_str(),
    });
    Ok(())
}

/// Uploads a block. It stays uncommitted until a block list references it.
pub async fn stage_block(
    ctx: &WorkflowContext<'_>,
    blob: &str,
    block_id: &str,
    data: Bytes,
) -> SampleResult<()> {
    let bytes = data.len();
    ctx.store
        .put_block(&ctx.container, blob, block_id, data)
        .await?;

    ctx.emit(WorkflowEvent::BlockStaged {
        blob: blob.to_string(),
        block_id: block_id.to_string(),
        bytes,
    });
    Ok(())
}

/// Fetches both committed and uncommitted blocks.
pub async fn list_blocks(ctx: &WorkflowContext<'_>, blob: &str) -> SampleResult<BlockList> {
    let list = ctx
        .store
        .get_block_list(&ctx.container, blob, BlockListType::All)
        .await?;
    ctx.emit(WorkflowEvent::block_listed(blob, &list));
    Ok(list)
}

/// Commits the given block references, replacing the blob's content.
pub async fn commit_blocks(
    ctx: &WorkflowContext<'_>,
    blob: &str,
    blocks: &[BlockRef],
) -> SampleResult<()> {
    ctx.store
        .put_block_list(&ctx.container, blob, blocks)
        .await
        .map_err(|e| SampleError::commit(blob, e))?;

    ctx.emit(WorkflowEvent::BlocksCommitted {
        blob: blob.to_string(),
        blocks: blocks.len(),
    });
    Ok(())
}

/// Commits every uncommitted block in staging order.
///
/// Returns the committed block IDs.
pub async fn commit_uncommitted(ctx: &WorkflowContext<'_>, blob: &str) -> SampleResult<Vec<String>> {
    let staged = ctx
        .store
        .get_block_list(&ctx.container, blob, BlockListType::Uncommitted)
        .await?;
    let ids: Vec<String> = staged
        .uncommitted_ids()
        .into_iter()
        .map(String::from)
        .collect();
    let refs: Vec<BlockRef> = ids.iter().cloned().map(BlockRef::Uncommitted).collect();

    commit_blocks(ctx, blob, &refs).await?;
    Ok(ids)
}

fn expect_state(
    blob: &str,
    list: &BlockList,
    block_id: &str,
    expected: BlockState,
) -> SampleResult<()> {
    let in_committed = list.committed_ids().contains(&block_id);
    let in_uncommitted = list.uncommitted_ids().contains(&block_id);
    let ok = match expected {
        BlockState::Committed => in_committed && !in_uncommitted,
        BlockState::Uncommitted => in_uncommitted && !in_committed,
    };
    if ok {
        Ok(())
    } else {
        Err(SampleError::Verification {
            blob: blob.to_string(),
            reason: format!(
                "block {} expected {} but found {:?}",
                block_id,
                expected.as_str(),
                list.state_of(block_id).map(|s| s.as_str())
            ),
        })
    }
}

/// Runs the two-phase block upload and downloads the committed blob.
///
/// Returns the committed payload.
pub async fn run(ctx: &WorkflowContext<'_>, settings: &BlockSettings) -> SampleResult<Bytes> {
    let blob = settings.blob.as_str();
    create_block_blob(ctx, blob).await?;

    let payload = ctx.payload.generate(settings.payload_len);
    stage_block(ctx, blob, &settings.block_id, payload.clone()).await?;

    let before = list_blocks(ctx, blob).await?;
    expect_state(blob, &before, &settings.block_id, BlockState::Uncommitted)?;

    commit_uncommitted(ctx, blob).await?;

    let after = list_blocks(ctx, blob).await?;
    expect_state(blob, &after, &settings.block_id, BlockState::Committed)?;

    let downloaded = download_blob(ctx, blob, &settings.output_file).await?;
    verify_content(blob, &payload, &downloaded)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::events::SilentSink;
    use crate::models::{BlockInfo, ContainerAccess};
    use crate::payload::FixedPayload;
    use crate::storage::{BlobStore, MemoryBlobStore};

    #[test]
    fn test_expect_state() {
        let list = BlockList {
            committed: vec![],
            uncommitted: vec![BlockInfo {
                block_id: "AAAAA".to_string(),
                size: 3,
                state: BlockState::Uncommitted,
            }],
        };
        assert!(expect_state("b1", &list, "AAAAA", BlockState::Uncommitted).is_ok());
        assert!(matches!(
            expect_state("b1", &list, "AAAAA", BlockState::Committed),
            Err(SampleError::Verification { .. })
        ));
        assert!(expect_state("b1", &list, "BBBBB", BlockState::Uncommitted).is_err());
    }

    #[tokio::test]
    async fn test_unreferenced_blocks_are_discarded() {
        let store = MemoryBlobStore::new();
        store
            .create_container_if_not_exists("c1", ContainerAccess::Private)
            .await
            .unwrap();
        let sink = SilentSink;
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        create_block_blob(&ctx, "b1").await.unwrap();
        stage_block(&ctx, "b1", "AAAAA", Bytes::from_static(b"keep")).await.unwrap();
        stage_block(&ctx, "b1", "BBBBB", Bytes::from_static(b"drop")).await.unwrap();
        commit_blocks(&ctx, "b1", &[BlockRef::Uncommitted("AAAAA".to_string())])
            .await
            .unwrap();

        let list = list_blocks(&ctx, "b1").await.unwrap();
        assert_eq!(list.committed_ids(), vec!["AAAAA"]);
        assert!(list.uncommitted.is_empty());
        assert_eq!(&store.get_blob("c1", "b1").await.unwrap()[..], b"keep");
    }

    #[tokio::test]
    async fn test_commit_uncommitted_keeps_staging_order() {
        let store = MemoryBlobStore::new();
        store
            .create_container_if_not_exists("c1", ContainerAccess::Private)
            .await
            .unwrap();
        let sink = SilentSink;
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        create_block_blob(&ctx, "b1").await.unwrap();
        stage_block(&ctx, "b1", "QQ==", Bytes::from_static(b"one ")).await.unwrap();
        stage_block(&ctx, "b1", "Qg==", Bytes::from_static(b"two")).await.unwrap();

        let ids = commit_uncommitted(&ctx, "b1").await.unwrap();
        assert_eq!(ids, vec!["QQ==".to_string(), "Qg==".to_string()]);
        assert_eq!(&store.get_blob("c1", "b1").await.unwrap()[..], b"one two");
    }

    #[tokio::test]
    async fn test_invalid_block_id_is_rejected() {
        let store = MemoryBlobStore::new();
        store
            .create_container_if_not_exists("c1", ContainerAccess::Private)
            .await
            .unwrap();
        let sink = SilentSink;
        let payload = FixedPayload::new("x");
        let ctx = WorkflowContext::new("c1", &store, &sink, &payload);

        create_block_blob(&ctx, "b1").await.unwrap();
        let err = stage_block(&ctx, "b1", "not base64!", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SampleError::Transport(ref e) if e.code == ErrorCode::InvalidBlockId
        ));
    }
}
