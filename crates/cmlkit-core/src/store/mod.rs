// ── Client-side object store ──
//
// Only labs are cached; nodes, interfaces and links live inside them.

mod lab_cache;

pub use lab_cache::LabCache;
