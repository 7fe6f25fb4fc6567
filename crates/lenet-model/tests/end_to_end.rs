//! End-to-end classification on the virtual SoC
//!
//! Stages weights and images into DDR, then runs the full pipeline through
//! the DMA/accelerator register protocol with both convolution strategies.

use lenet_driver::{Platform, SocConfig, VirtualSoc};
use lenet_model::fixed::{checksum_i32, checksum_i8};
use lenet_model::{
    classify_host, Classifier, ConvStrategy, Dataset, InferenceConfig, LenetWeights, RunSummary,
};
use lenet_soc::network::{IMG_SIZE, WT_CONV1_SIZE, WT_CONV2_SIZE, WT_FC_SIZE, WT_TOTAL_SIZE};

fn staged_soc(weights: &LenetWeights, dataset: &Dataset) -> VirtualSoc {
    let mut soc = VirtualSoc::new(SocConfig::default()).expect("SoC");
    weights.stage(soc.ddr_mut()).expect("stage weights");
    dataset.stage(soc.ddr_mut()).expect("stage dataset");
    soc
}

fn run(weights: &LenetWeights, dataset: &Dataset, strategy: ConvStrategy, shift: u32) -> RunSummary {
    let mut soc = staged_soc(weights, dataset);
    let config = InferenceConfig::default()
        .with_strategy(strategy)
        .with_shift(shift)
        .with_image_count(dataset.len());
    Classifier::new(&mut soc, config).expect("classifier").run()
}

/// conv1 filter 0 and every conv2 filter sum a 5×5 window of channel 0;
/// only class 7 has non-zero FC weights.
fn class_seven_weights() -> LenetWeights {
    let mut blob = vec![0u8; WT_TOTAL_SIZE];
    blob[..25].fill(1);
    let conv2 = &mut blob[WT_CONV1_SIZE..WT_CONV1_SIZE + WT_CONV2_SIZE];
    for filter in conv2.chunks_exact_mut(8 * 25) {
        filter[..25].fill(1);
    }
    let fc = &mut blob[WT_CONV1_SIZE + WT_CONV2_SIZE..];
    assert_eq!(fc.len(), WT_FC_SIZE);
    fc[7 * 256..8 * 256].fill(1);
    LenetWeights::from_blob(blob).expect("weights")
}

#[test]
fn all_zero_image_and_weights() {
    let weights = LenetWeights::zeros();
    let dataset = Dataset::new(vec![0u8; IMG_SIZE], vec![0u8]).unwrap();

    for strategy in [ConvStrategy::Software, ConvStrategy::Hardware] {
        let mut soc = staged_soc(&weights, &dataset);
        let config = InferenceConfig::default()
            .with_strategy(strategy)
            .with_image_count(1);
        let mut classifier = Classifier::new(&mut soc, config).unwrap();
        let arena = *classifier.arena();
        classifier.load_parameters();
        let record = classifier.classify(0);
        assert_eq!(record.predicted, 0);
        assert!(record.is_correct());

        let local = soc.local();
        assert!(local.i32s(arena.conv1_acc).iter().all(|&v| v == 0));
        assert!(local.i8s(arena.pool1).iter().all(|&v| v == 0));
        assert!(local.i32s(arena.conv2_acc).iter().all(|&v| v == 0));
        assert!(local.i8s(arena.pool2).iter().all(|&v| v == 0));
        assert_eq!(local.i32s(arena.scores), &[0; 10]);
    }
}

#[test]
fn known_image_gets_precomputed_label() {
    // flat image: conv1 saturates to 127 at shift 0, so does conv2, and
    // only class 7 scores
    let weights = class_seven_weights();
    let dataset = Dataset::new(vec![64u8; IMG_SIZE * 3], vec![7u8; 3]).unwrap();

    let (class, scores) = classify_host(dataset.image(0), &weights, 0);
    assert_eq!(class, 7);
    assert_eq!(scores[7], 256 * 127);

    for strategy in [ConvStrategy::Software, ConvStrategy::Hardware] {
        for _ in 0..2 {
            let summary = run(&weights, &dataset, strategy, 0);
            assert_eq!(summary.images(), 3);
            assert_eq!(summary.mispredicted(), 0, "{strategy:?}");
            assert_eq!(summary.predictions(), vec![7, 7, 7]);
        }
    }
}

#[test]
fn hardware_and_software_agree() {
    let weights = LenetWeights::synthetic(11);
    let dataset = Dataset::synthetic(12, 8, &weights, 9).unwrap();

    let sw = run(&weights, &dataset, ConvStrategy::Software, 9);
    let hw = run(&weights, &dataset, ConvStrategy::Hardware, 9);

    assert_eq!(sw.predictions(), hw.predictions());
    assert_eq!(sw.correct, 8);
    assert_eq!(hw.correct, 8);
    assert!(hw.cycles < sw.cycles, "accelerator should be faster");
}

#[test]
fn pipeline_stages_match_host_reference() {
    let weights = LenetWeights::synthetic(21);
    let dataset = Dataset::synthetic(22, 1, &weights, 9).unwrap();

    for strategy in [ConvStrategy::Software, ConvStrategy::Hardware] {
        let mut soc = staged_soc(&weights, &dataset);
        let config = InferenceConfig::default()
            .with_strategy(strategy)
            .with_image_count(1);
        let mut classifier = Classifier::new(&mut soc, config).unwrap();
        let arena = *classifier.arena();
        classifier.load_parameters();
        classifier.classify(0);

        let (_, scores) = classify_host(dataset.image(0), &weights, 9);
        let local = soc.local();
        assert_eq!(local.i32s(arena.scores), &scores[..]);
        assert_eq!(checksum_i32(local.i32s(arena.scores)), checksum_i32(&scores));
        assert!(checksum_i8(local.i8s(arena.pool2)) >= 0);
    }
}

#[test]
fn repeated_runs_are_deterministic() {
    let weights = LenetWeights::synthetic(31);
    let dataset = Dataset::synthetic(32, 4, &weights, 9).unwrap();
    let a = run(&weights, &dataset, ConvStrategy::Hardware, 9);
    let b = run(&weights, &dataset, ConvStrategy::Hardware, 9);
    assert_eq!(a, b);
}

#[test]
fn wrong_labels_are_counted() {
    let weights = class_seven_weights();
    let dataset = Dataset::new(vec![64u8; IMG_SIZE * 2], vec![7u8, 3]).unwrap();
    let summary = run(&weights, &dataset, ConvStrategy::Software, 0);
    assert_eq!(summary.correct, 1);
    assert_eq!(summary.mispredicted(), 1);
    assert!(!summary.records[1].is_correct());
}

#[test]
fn dataset_files_round_trip_through_disk() {
    let dir = std::env::temp_dir().join(format!("lenet-e2e-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let images = dir.join("images.bin");
    let labels = dir.join("labels.bin");
    std::fs::write(&images, vec![64u8; IMG_SIZE * 2]).unwrap();
    std::fs::write(&labels, [7u8, 7]).unwrap();

    let dataset = Dataset::from_files(&images, &labels).unwrap();
    let summary = run(&class_seven_weights(), &dataset, ConvStrategy::Hardware, 0);
    assert_eq!(summary.correct, 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn per_image_cycles_sum_to_total() {
    let weights = LenetWeights::synthetic(41);
    let dataset = Dataset::synthetic(42, 3, &weights, 9).unwrap();
    let summary = run(&weights, &dataset, ConvStrategy::Software, 9);
    let sum: u64 = summary.records.iter().map(|r| u64::from(r.cycles)).sum();
    assert_eq!(sum, summary.cycles);
    assert!(summary.records.iter().all(|r| r.cycles > 0));
}
