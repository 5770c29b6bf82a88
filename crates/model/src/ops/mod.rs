//! Model update operations, one per section. Assembly order lives in
//! [`crate::pipeline::ModelUpdater`].

mod add_compiled_deps;
mod add_deps_gen_src_archives;
mod add_deps_src_archives;
mod add_gen_src_archives;
mod add_gen_src_roots;

pub use add_compiled_deps::AddCompiledDeps;
pub use add_deps_gen_src_archives::AddDependencyGeneratedSourceArchives;
pub use add_deps_src_archives::AddDependencySourceArchives;
pub use add_gen_src_archives::AddGeneratedSourceArchives;
pub use add_gen_src_roots::AddGeneratedSourceRoots;
