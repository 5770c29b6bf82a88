use scopesync_core::{Label, Message, SyncContext};
use scopesync_graph::Snapshot;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The candidate targets a source file maps to. More than one candidate
/// means the caller must pick before the file's dependencies can be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetsToBuild {
    pub source_file: PathBuf,
    pub targets: BTreeSet<Label>,
}

impl TargetsToBuild {
    pub fn is_ambiguous(&self) -> bool {
        self.targets.len() > 1
    }
}

/// Partitions a set of requested source paths into targets that can be built
/// directly and groups needing caller disambiguation.
///
/// Ambiguous groups are excluded from the build and surfaced as a warning;
/// the UI layer owns presenting a choice for them.
#[derive(Debug, Default)]
pub struct TargetDisambiguator {
    pub unambiguous_targets: BTreeSet<Label>,
    pub ambiguous: Vec<TargetsToBuild>,
}

impl TargetDisambiguator {
    pub fn for_paths<'a>(
        snapshot: &Snapshot,
        paths: impl IntoIterator<Item = &'a Path>,
    ) -> Self {
        let mut disambiguator = Self::default();
        for path in paths {
            let Some(owners) = snapshot.target_owners(path) else {
                continue;
            };
            if owners.is_empty() {
                continue;
            }
            let to_build = TargetsToBuild {
                source_file: path.to_path_buf(),
                targets: owners,
            };
            if to_build.is_ambiguous() {
                disambiguator.ambiguous.push(to_build);
            } else {
                disambiguator.unambiguous_targets.extend(to_build.targets);
            }
        }
        disambiguator
    }

    /// Warn about ambiguous groups, listing the affected files. No-op when
    /// every path resolved cleanly.
    pub fn report_ambiguous(&self, context: &SyncContext) {
        if self.ambiguous.is_empty() {
            return;
        }
        context.set_has_warnings();
        let files = self
            .ambiguous
            .iter()
            .map(|group| group.source_file.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        context.output(Message::warning(format!(
            "Ambiguous target sets for some files; not building them: {files}"
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopesync_core::CollectingSink;
    use scopesync_graph::{BuildGraph, LanguageClass, ProjectDefinition};
    use std::sync::Arc;

    fn snapshot() -> Snapshot {
        let graph = BuildGraph::builder()
            .target("//app:main", LanguageClass::Jvm, Vec::<Label>::new())
            .target("//app:main_test_lib", LanguageClass::Jvm, Vec::<Label>::new())
            .target("//app:other", LanguageClass::Jvm, Vec::<Label>::new())
            .source("app/Main.java", "//app:main")
            .source("app/Main.java", "//app:main_test_lib")
            .source("app/Other.java", "//app:other")
            .build();
        Snapshot::new(
            Arc::new(graph),
            Arc::new(ProjectDefinition::new(["app"], Vec::<&str>::new())),
            1,
        )
    }

    #[test]
    fn test_partition_paths() {
        let snapshot = snapshot();
        let paths = [Path::new("app/Main.java"), Path::new("app/Other.java")];
        let disambiguator = TargetDisambiguator::for_paths(&snapshot, paths);

        assert_eq!(
            disambiguator.unambiguous_targets,
            [Label::new("//app:other")].into()
        );
        assert_eq!(disambiguator.ambiguous.len(), 1);
        assert!(disambiguator.ambiguous[0].is_ambiguous());
    }

    #[test]
    fn test_unowned_paths_are_skipped() {
        let snapshot = snapshot();
        let disambiguator =
            TargetDisambiguator::for_paths(&snapshot, [Path::new("app/Unknown.java")]);
        assert!(disambiguator.unambiguous_targets.is_empty());
        assert!(disambiguator.ambiguous.is_empty());
    }

    #[test]
    fn test_report_ambiguous_warns_and_excludes() {
        let snapshot = snapshot();
        let disambiguator =
            TargetDisambiguator::for_paths(&snapshot, [Path::new("app/Main.java")]);
        let sink = Arc::new(CollectingSink::new());
        let context = SyncContext::with_sink(sink.clone());

        disambiguator.report_ambiguous(&context);

        assert!(context.has_warnings());
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.contains("app/Main.java"));
        assert!(messages[0].text.contains("not building them"));
    }

    #[test]
    fn test_no_warning_when_everything_resolves() {
        let snapshot = snapshot();
        let disambiguator =
            TargetDisambiguator::for_paths(&snapshot, [Path::new("app/Other.java")]);
        let context = SyncContext::new();
        disambiguator.report_ambiguous(&context);
        assert!(!context.has_warnings());
    }
}
