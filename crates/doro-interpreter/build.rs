fn main() {
    for path in ["../../res/examples/**/*.doro", "../../res/benchmarks/**/*.doro"] {
        build_deps::rerun_if_changed_paths(path).expect("could not read path");
    }
}
