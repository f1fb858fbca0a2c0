// ─── SWT Release Fetcher Core ───
// Mirrors the current SWT release from eclipse.org into a Maven repository.
//
// Architecture:
//   core/
//     platform/   — Platform catalog (archive suffix → artifact id)
//     mirror/     — Link following + mirror/version derivation
//     change/     — Homepage snapshot comparison
//     downloader/ — Checksum lookup, MD5-validated downloads
//     maven/      — Zip repackaging, POM template, deploy:deploy-file
//     settings/   — fetcher.json + immutable run configuration
//     sync        — One run: resolve → detect change → fetch/publish each entry

pub mod change;
pub mod downloader;
pub mod error;
pub mod http;
pub mod maven;
pub mod mirror;
pub mod platform;
pub mod settings;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;
