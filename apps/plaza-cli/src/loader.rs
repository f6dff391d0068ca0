use plaza_assets::{AssetError, Image, ImageKey, LoadQueue, SpriteLoader, load_image, resolve_source};
use plaza_client::{Client, Event};
use plaza_net::Outbox;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;

pub type LoadResult = (ImageKey, Result<Image, AssetError>);

/// Decodes images on tokio's blocking pool and reports back over a channel.
///
/// Must be used from inside a runtime.
pub struct BlockingPoolLoader {
    root: PathBuf,
    results: UnboundedSender<LoadResult>,
}

impl BlockingPoolLoader {
    pub fn new(root: impl Into<PathBuf>, results: UnboundedSender<LoadResult>) -> Self {
        Self {
            root: root.into(),
            results,
        }
    }
}

impl SpriteLoader for BlockingPoolLoader {
    fn request(&mut self, key: ImageKey, source: &str) {
        let path = match resolve_source(&self.root, source) {
            Ok(path) => path,
            Err(e) => {
                let _ = self.results.send((key, Err(e)));
                return;
            }
        };
        let results = self.results.clone();
        let source = source.to_owned();
        tokio::task::spawn_blocking(move || {
            let result = load_image(source, &path);
            // The session may already be over.
            let _ = results.send((key, result));
        });
    }
}

/// Serve every queued request synchronously and feed the results to the client.
///
/// Returns how many requests were served.
pub fn serve_queue<O: Outbox>(queue: &LoadQueue, root: &Path, client: &mut Client<O>) -> usize {
    let requests = queue.drain();
    let served = requests.len();
    for (key, source) in requests {
        let result = resolve_source(root, &source).and_then(|path| load_image(source, path));
        client.handle(Event::SpriteResolved { key, result });
    }
    served
}
