use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{ImageFormat, Rgba, RgbaImage};

use super::*;
use crate::boundary::SubjectImage;
use crate::foundation::core::Region;
use crate::sequence::assemble::{PaletteFrame, encode_gif};
use crate::sequence::quantize::quantize_frame;

struct StubSource {
    fingerprint: Mutex<String>,
    bytes: Vec<u8>,
    fail: bool,
    fetches: AtomicUsize,
}

impl StubSource {
    fn new(fingerprint: &str) -> Self {
        Self {
            fingerprint: Mutex::new(fingerprint.to_string()),
            bytes: red_png(),
            fail: false,
            fetches: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("unused")
        }
    }
}

impl SubjectSource for &'static StubSource {
    fn fetch_subject_image(&self, _subject_id: &str) -> BoilResult<SubjectImage> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BoilError::Other(anyhow::anyhow!("avatar endpoint returned 503")));
        }
        let fingerprint = self
            .fingerprint
            .lock()
            .map_err(|_| BoilError::input("poisoned"))?
            .clone();
        Ok(SubjectImage {
            fingerprint,
            bytes: self.bytes.clone(),
        })
    }
}

struct CountingOptimizer(&'static AtomicUsize);

impl PostOptimizer for CountingOptimizer {
    fn name(&self) -> &str {
        "counting"
    }

    fn optimize(&self, artifact: &[u8]) -> BoilResult<Vec<u8>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(artifact.to_vec())
    }
}

/// Records what was delivered, reading the file while it still exists.
#[derive(Default)]
struct Recorder {
    delivered: Vec<(PathBuf, String, Vec<u8>)>,
    fail: bool,
}

impl Delivery for Recorder {
    fn deliver(&mut self, artifact: &Path, caption: &str) -> BoilResult<()> {
        if self.fail {
            return Err(BoilError::delivery("upload rejected"));
        }
        let bytes = std::fs::read(artifact).map_err(|e| BoilError::delivery(e.to_string()))?;
        self.delivered
            .push((artifact.to_path_buf(), caption.to_string(), bytes));
        Ok(())
    }
}

fn leak<T>(v: T) -> &'static T {
    Box::leak(Box::new(v))
}

fn red_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(12, 12, Rgba([255, 0, 0, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn template_gif() -> Vec<u8> {
    let green = Region::from_corners(8, 8, 23, 23);
    let frames = [60u32, 80, 100]
        .into_iter()
        .map(|duration_ms| {
            let img = RgbaImage::from_fn(32, 32, |x, y| {
                if green.contains(x, y) {
                    Rgba([0, 255, 0, 255])
                } else {
                    Rgba([30, 30, 90, 255])
                }
            });
            PaletteFrame {
                indexed: quantize_frame(&img, 60).unwrap(),
                duration_ms,
            }
        })
        .collect::<Vec<_>>();
    encode_gif(&frames).unwrap()
}

struct Fixture {
    _dir: tempfile::TempDir,
    cfg: BoilConfig,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("template_boiling.gif"), template_gif()).unwrap();
    std::fs::write(data.join("boiler_pet.gif"), b"GIF89a-pet").unwrap();

    let mut cfg = BoilConfig {
        template_path: data.join("template_boiling.gif"),
        pet_path: data.join("boiler_pet.gif"),
        cache_dir: dir.path().join("cache"),
        temp_dir: dir.path().join("temp"),
        ..BoilConfig::default()
    };
    cfg.optimizer.enabled = false;
    Fixture { _dir: dir, cfg }
}

fn session(
    cfg: &BoilConfig,
    source: &'static StubSource,
    optimizer: Option<&'static AtomicUsize>,
) -> Session {
    Session::new(
        cfg.clone(),
        Box::new(source),
        optimizer.map(|c| Box::new(CountingOptimizer(c)) as Box<dyn PostOptimizer>),
    )
    .unwrap()
}

fn scratch_entries(cfg: &BoilConfig) -> usize {
    match std::fs::read_dir(&cfg.temp_dir) {
        Ok(dir) => dir.count(),
        Err(_) => 0,
    }
}

#[test]
fn fresh_render_is_cached_and_delivered() {
    let fx = fixture();
    let source = leak(StubSource::new("abc123"));
    let s = session(&fx.cfg, source, None);
    let subject = Subject::new("4242").with_mention("<@4242>");

    let mut out = Recorder::default();
    let report = s.boil(&subject, &mut out).unwrap();

    assert_eq!(report.origin, ArtifactOrigin::Fresh);
    assert_eq!(report.key.file_name(), "4242_abc123.gif");
    let stats = report.stats.unwrap();
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.composited, 3);

    let cached = report.cached_path.unwrap();
    assert_eq!(cached, fx.cfg.cache_dir.join("4242_abc123.gif"));
    let cached_bytes = std::fs::read(&cached).unwrap();
    assert_eq!(report.size_bytes, cached_bytes.len() as u64);

    assert_eq!(out.delivered.len(), 1);
    let (_, caption, bytes) = &out.delivered[0];
    assert_eq!(caption, &boil_caption("<@4242>"));
    assert_eq!(bytes, &cached_bytes);
    assert_eq!(scratch_entries(&fx.cfg), 0);
}

#[test]
fn cache_hit_skips_the_pipeline() {
    let fx = fixture();
    let source = leak(StubSource::new("abc123"));
    let runs = leak(AtomicUsize::new(0));
    let s = session(&fx.cfg, source, Some(runs));
    let subject = Subject::new("4242");

    let mut first = Recorder::default();
    s.boil(&subject, &mut first).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let mut second = Recorder::default();
    let report = s.boil(&subject, &mut second).unwrap();
    assert_eq!(report.origin, ArtifactOrigin::Cache);
    assert!(report.stats.is_none());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);

    let (path, _, bytes) = &second.delivered[0];
    assert_eq!(path, &fx.cfg.cache_dir.join("4242_abc123.gif"));
    assert_eq!(bytes, &first.delivered[0].2);
    assert_eq!(report.size_bytes, bytes.len() as u64);
    assert!(report.size_bytes > 0);
}

#[test]
fn fetch_failure_is_an_input_error_with_no_side_effects() {
    let fx = fixture();
    let source = leak(StubSource::failing());
    let s = session(&fx.cfg, source, None);

    let mut out = Recorder::default();
    let err = s.boil(&Subject::new("4242"), &mut out).unwrap_err();
    assert!(matches!(err, BoilError::Input(_)), "{err}");
    assert!(out.delivered.is_empty());
    assert!(s.cache().entries_for("4242").unwrap().is_empty());
    assert_eq!(scratch_entries(&fx.cfg), 0);
}

#[test]
fn oversized_artifact_is_rejected_and_not_cached() {
    let mut fx = fixture();
    fx.cfg.max_artifact_bytes = 16;
    let source = leak(StubSource::new("abc123"));
    let s = session(&fx.cfg, source, None);

    let mut out = Recorder::default();
    let err = s.boil(&Subject::new("4242"), &mut out).unwrap_err();
    match err {
        BoilError::SizeLimit { size, limit } => {
            assert_eq!(limit, 16);
            assert!(size > 16);
        }
        other => panic!("expected size limit, got {other}"),
    }
    assert!(out.delivered.is_empty());
    assert!(s.cache().entries_for("4242").unwrap().is_empty());
    assert_eq!(scratch_entries(&fx.cfg), 0);
}

#[test]
fn new_fingerprint_replaces_stale_entry() {
    let fx = fixture();
    let source = leak(StubSource::new("old"));
    let s = session(&fx.cfg, source, None);
    let subject = Subject::new("4242");

    s.boil(&subject, &mut Recorder::default()).unwrap();
    *source.fingerprint.lock().unwrap() = "new".to_string();
    let report = s.boil(&subject, &mut Recorder::default()).unwrap();

    assert_eq!(report.origin, ArtifactOrigin::Fresh);
    assert_eq!(
        s.cache().entries_for("4242").unwrap(),
        vec![fx.cfg.cache_dir.join("4242_new.gif")]
    );
}

#[test]
fn missing_template_fails_before_fetching() {
    let mut fx = fixture();
    fx.cfg.template_path = fx.cfg.cache_dir.join("nope.gif");
    let source = leak(StubSource::new("abc123"));
    let s = session(&fx.cfg, source, None);

    let err = s
        .boil(&Subject::new("4242"), &mut Recorder::default())
        .unwrap_err();
    assert!(matches!(err, BoilError::Input(_)));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
}

#[test]
fn cache_write_failure_still_delivers() {
    let fx = fixture();
    let source = leak(StubSource::new("abc123"));
    let s = session(&fx.cfg, source, None);

    // A plain file where the cache directory should be.
    std::fs::remove_dir_all(&fx.cfg.cache_dir).unwrap();
    std::fs::write(&fx.cfg.cache_dir, b"not a directory").unwrap();

    let mut out = Recorder::default();
    let report = s.boil(&Subject::new("4242"), &mut out).unwrap();
    assert_eq!(report.origin, ArtifactOrigin::Fresh);
    assert!(report.cached_path.is_none());
    assert_eq!(out.delivered.len(), 1);
    assert_eq!(scratch_entries(&fx.cfg), 0);
}

#[test]
fn delivery_failure_surfaces_and_cleans_scratch() {
    let fx = fixture();
    let source = leak(StubSource::new("abc123"));
    let s = session(&fx.cfg, source, None);

    let mut out = Recorder {
        fail: true,
        ..Recorder::default()
    };
    let err = s.boil(&Subject::new("4242"), &mut out).unwrap_err();
    assert!(matches!(err, BoilError::Delivery(_)));
    assert_eq!(err.user_message(), "❌ Failed to send the result.");
    assert_eq!(scratch_entries(&fx.cfg), 0);
}

#[test]
fn concurrent_boils_leave_one_entry() {
    let fx = fixture();
    let source = leak(StubSource::new("abc123"));
    let s = session(&fx.cfg, source, None);
    let subject = Subject::new("4242");

    std::thread::scope(|scope| {
        let handles = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    let mut out = Recorder::default();
                    s.boil(&subject, &mut out).map(|_| out.delivered.len())
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            assert_eq!(h.join().unwrap().unwrap(), 1);
        }
    });

    assert_eq!(s.cache().entries_for("4242").unwrap().len(), 1);
    assert_eq!(scratch_entries(&fx.cfg), 0);
}

#[test]
fn pet_delivers_the_static_animation() {
    let fx = fixture();
    let s = session(&fx.cfg, leak(StubSource::new("abc123")), None);

    let mut out = Recorder::default();
    s.pet(&mut out).unwrap();
    let (path, caption, bytes) = &out.delivered[0];
    assert_eq!(path, &fx.cfg.pet_path);
    assert_eq!(caption, PET_CAPTION);
    assert_eq!(bytes, b"GIF89a-pet");
}

#[test]
fn pet_without_animation_is_an_input_error() {
    let mut fx = fixture();
    fx.cfg.pet_path = fx.cfg.temp_dir.join("missing.gif");
    let s = session(&fx.cfg, leak(StubSource::new("abc123")), None);

    let err = s.pet(&mut Recorder::default()).unwrap_err();
    assert!(matches!(err, BoilError::Input(_)));
}
