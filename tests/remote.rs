mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use common::{ZipBuilder, repeated_lines};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use zipseek::{
    ArchiveSource, HttpRangeReader, PatternSet, ReadAt, SearchConfig, SearchSummary,
    search_archive,
};

/// Largest body sent per Range request; readers must ask for the rest.
const MAX_BODY: u64 = 64;

/// Serve `archive` over HTTP/1.1 with HEAD and single-range GET support.
async fn serve(archive: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let archive = Arc::new(archive);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle(stream, archive.clone()));
        }
    });
    addr
}

async fn handle(stream: TcpStream, archive: Arc<Vec<u8>>) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    let size = archive.len() as u64;

    loop {
        let mut request = String::new();
        if reader.read_line(&mut request).await.unwrap_or(0) == 0 {
            return;
        }

        let mut range = None;
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).await.unwrap_or(0) == 0 {
                return;
            }
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':')
                && name.eq_ignore_ascii_case("range")
            {
                range = parse_range(value.trim());
            }
        }

        let response = if request.starts_with("HEAD") {
            format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\n\r\n",
                size
            )
            .into_bytes()
        } else {
            match range {
                Some((start, end)) if start < size => {
                    let end = end.min(size - 1).min(start + MAX_BODY - 1);
                    let body = &archive[start as usize..=end as usize];
                    let mut out = format!(
                        "HTTP/1.1 206 Partial Content\r\n\
                         Content-Range: bytes {}-{}/{}\r\n\
                         Content-Length: {}\r\n\r\n",
                        start,
                        end,
                        size,
                        body.len()
                    )
                    .into_bytes();
                    out.extend_from_slice(body);
                    out
                }
                _ => b"HTTP/1.1 416 Range Not Satisfiable\r\nContent-Length: 0\r\n\r\n".to_vec(),
            }
        };

        if write.write_all(&response).await.is_err() {
            return;
        }
    }
}

fn parse_range(value: &str) -> Option<(u64, u64)> {
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

fn fixture() -> Vec<u8> {
    let content = repeated_lines(40, "needle");
    ZipBuilder::new()
        .stored("plain.txt", &content)
        .deflated("packed.txt", &content)
        .stored("other.txt", b"no match in here")
        .finish()
}

async fn search(source: &ArchiveSource, config: SearchConfig) -> SearchSummary {
    let patterns = PatternSet::new(["needle", "line 2"], &config).unwrap();
    search_archive(source, patterns, config, |_| {}).await.unwrap()
}

fn positions(summary: &SearchSummary, entry: &str) -> Vec<(String, u32, u32, u64)> {
    summary
        .result(entry)
        .unwrap()
        .occurrences
        .iter()
        .map(|o| (o.pattern.clone(), o.line, o.column, o.offset))
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_range_reads_are_stitched() {
    let archive = fixture();
    let addr = serve(archive.clone()).await;

    let reader = HttpRangeReader::new(format!("http://{}/fixture.zip", addr))
        .await
        .unwrap();
    assert_eq!(reader.size(), archive.len() as u64);

    let mut buf = vec![0u8; 200];
    let n = reader.read_at(10, &mut buf).await.unwrap();
    assert_eq!(n, 200);
    assert_eq!(buf, archive[10..210]);
    assert_eq!(reader.transferred_bytes(), 200);

    // Reads are clipped at the end of the archive.
    let tail = archive.len() as u64 - 5;
    let n = reader.read_at(tail, &mut buf).await.unwrap();
    assert_eq!(n, 5);
    assert_eq!(reader.read_at(archive.len() as u64, &mut buf).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remote_search_matches_local() {
    let archive = fixture();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fixture.zip");
    std::fs::write(&path, &archive).unwrap();
    let addr = serve(archive).await;

    let local = ArchiveSource::Local(path);
    let remote = ArchiveSource::parse(&format!("http://{}/fixture.zip", addr));
    assert!(remote.is_remote());

    // Chunked reads, then whole-entry reads buffered from the network.
    for config in [
        SearchConfig::default().chunk_size(32),
        SearchConfig::default().mmap_threshold(0),
    ] {
        let expected = search(&local, config.clone()).await;
        let summary = search(&remote, config).await;

        assert!(summary.failed_entries.is_empty());
        assert_eq!(summary.total_matches, expected.total_matches);
        assert!(summary.total_matches > 0);
        for name in ["plain.txt", "packed.txt", "other.txt"] {
            assert_eq!(positions(&summary, name), positions(&expected, name));
        }
        assert!(summary.bytes_transferred > 0);
        assert_eq!(expected.bytes_transferred, 0);
    }
}
