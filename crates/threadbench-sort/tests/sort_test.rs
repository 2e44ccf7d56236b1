use threadbench_core::SortConfig;
use threadbench_sort::{
    generate_input, is_non_decreasing, sort_baseline, sort_partitioned, Partition, SortHarness,
};

fn sorted_copy(values: &[i32]) -> Vec<i32> {
    let mut v = values.to_vec();
    v.sort();
    v
}

#[test]
fn test_million_elements_eight_chunks() {
    let input = generate_input(1_000_000, Some(42));
    let outcome = sort_partitioned(&input, 8).unwrap();

    let partition = outcome.partition.unwrap();
    assert_eq!(partition.chunk_size, 125_000);
    assert_eq!(partition.dropped(), 0);
    assert_eq!(outcome.output.len(), 1_000_000);
    assert!(is_non_decreasing(&outcome.output));
    assert_eq!(outcome.output, sorted_copy(&input));
}

#[test]
fn test_ten_elements_three_chunks_drops_last() {
    let input = vec![40, 10, 30, 20, 90, 80, 70, 60, 50, -5];
    let outcome = sort_partitioned(&input, 3).unwrap();

    assert_eq!(outcome.partition.unwrap().chunk_size, 3);
    assert_eq!(outcome.dropped(), 1);
    assert_eq!(outcome.output.len(), 9);
    assert!(is_non_decreasing(&outcome.output));
    // Index 9 holds the smallest value, so its absence is observable.
    assert!(!outcome.output.contains(&input[9]));
    assert_eq!(outcome.output, sorted_copy(&input[..9]));
}

#[test]
fn test_result_length_is_chunks_times_chunk_size() {
    let input = generate_input(10_007, Some(1));
    for chunk_count in [1, 2, 3, 4, 7, 8, 16] {
        let outcome = sort_partitioned(&input, chunk_count).unwrap();
        let plan = Partition::plan(input.len(), chunk_count).unwrap();
        assert_eq!(outcome.output.len(), chunk_count * (input.len() / chunk_count));
        assert_eq!(outcome.output, sorted_copy(&input[..plan.covered()]));
    }
}

#[test]
fn test_baseline_is_sorted_permutation() {
    let input = generate_input(50_000, Some(7));
    let baseline = sort_baseline(&input);
    assert_eq!(baseline.output.len(), input.len());
    assert!(is_non_decreasing(&baseline.output));
    assert_eq!(baseline.output, sorted_copy(&input));
}

#[test]
fn test_baseline_is_idempotent() {
    let input = generate_input(20_000, Some(11));
    let once = sort_baseline(&input);
    let twice = sort_baseline(&once.output);
    assert_eq!(once.output, twice.output);
}

#[test]
fn test_harness_reports_baseline_then_each_chunk_count() {
    let harness = SortHarness::new(SortConfig {
        array_size: 10,
        chunk_counts: vec![2, 3, 4],
        seed: Some(5),
    })
    .unwrap();
    let reports = harness.run().unwrap();

    let labels: Vec<_> = reports.iter().map(|r| r.measurement.label.as_str()).collect();
    assert_eq!(
        labels,
        [
            "single-threaded sort",
            "parallel sort (2 threads)",
            "parallel sort (3 threads)",
            "parallel sort (4 threads)",
        ]
    );
    let lens: Vec<_> = reports.iter().map(|r| r.len).collect();
    assert_eq!(lens, vec![10, 10, 9, 8]);
    let dropped: Vec<_> = reports.iter().map(|r| r.dropped).collect();
    assert_eq!(dropped, vec![0, 0, 1, 2]);
    assert!(reports.iter().all(|r| r.sorted));
}

#[test]
fn test_harness_rejects_zero_chunks() {
    let config = SortConfig {
        chunk_counts: vec![0],
        ..SortConfig::default()
    };
    assert!(SortHarness::new(config).is_err());
}

#[test]
fn test_report_json_shape() {
    let harness = SortHarness::new(SortConfig {
        array_size: 16,
        chunk_counts: vec![4],
        seed: Some(2),
    })
    .unwrap();
    let reports = harness.run().unwrap();
    let json = serde_json::to_value(&reports[1]).unwrap();
    assert_eq!(json["label"], "parallel sort (4 threads)");
    assert_eq!(json["threads"], 4);
    assert_eq!(json["chunk_size"], 4);
    assert_eq!(json["sorted"], true);
}
