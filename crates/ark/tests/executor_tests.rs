// Executor tests — host ↔ device copies through the executor facade
//
// Every test places a small model on the reference host runtime and checks
// what lands in device memory (by reading it back) and in host arrays.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ark::prelude::*;
use ark::{contiguous_source, Layout};

fn make_executor(model: Model) -> Executor {
    Executor::new::<HostRuntime>(ExecutorConfig::new(0, 0, 1, "test"), model)
        .expect("failed to create executor")
}

fn read_back<T: ark::WithDType>(exec: &Executor, t: &DeviceTensor) -> Vec<T> {
    let mut out = HostArray::<T>::zeros(t.elem_count());
    exec.tensor_memcpy_device_to_host(&mut out, t).unwrap();
    out.to_vec().unwrap()
}

// Construction

#[test]
fn test_construction_binds_context() {
    let mut model = Model::new("ctx");
    model.tensor("x", 4, DType::F32);
    let config = ExecutorConfig::new(1, 2, 4, "rank2").with_num_warps_per_sm(8);
    let exec = Executor::new::<HostRuntime>(config, model).unwrap();
    assert_eq!(exec.gpu_id(), 1);
    assert_eq!(exec.rank(), 2);
    assert_eq!(exec.world_size(), 4);
    assert_eq!(exec.name(), "rank2");
    assert_eq!(exec.num_warps_per_sm(), 8);
    assert_eq!(exec.device_name(), "host:1");
    assert_eq!(exec.model().name(), "ctx");
}

#[test]
fn test_default_warps_per_sm() {
    let exec = make_executor(Model::new("m"));
    assert_eq!(exec.num_warps_per_sm(), 16);
}

#[test]
fn test_construction_rejects_bad_rank() {
    let config = ExecutorConfig::new(0, 4, 4, "bad");
    let err = Executor::new::<HostRuntime>(config, Model::new("m")).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { arg: "rank", .. }));
}

#[test]
fn test_with_runtime_composes_existing_runtime() {
    let mut model = Model::new("m");
    let x = model.tensor("x", 2, DType::F64);
    let config = ExecutorConfig::default();
    let runtime = HostRuntime::create(&config, &model).unwrap();
    let exec = Executor::with_runtime(config, model, Box::new(runtime)).unwrap();
    let t = exec.tensor(x).unwrap();
    exec.tensor_memcpy_host_to_device(&t, &HostArray::from_vec(vec![1.5f64, -2.5], 2).unwrap())
        .unwrap();
    assert_eq!(read_back::<f64>(&exec, &t), vec![1.5, -2.5]);
}

#[test]
fn test_tensor_lookup_by_name() {
    let mut model = Model::new("named");
    let x = model.tensor("x", (2, 3), DType::F32);
    let x_t = model.transpose(x, 0, 1).unwrap();
    let exec = make_executor(model);

    assert_eq!(exec.tensor_by_name("x").unwrap(), exec.tensor(x).unwrap());
    let view = exec.tensor_by_name("x.transpose(0,1)").unwrap();
    assert_eq!(view.id(), x_t);
    assert_eq!(view.shape().dims(), &[3, 2]);
    assert!(matches!(exec.tensor_by_name("y"), Err(Error::Msg(_))));
}

// Host → device, device → host

#[test]
fn test_round_trip_2x2_f32() {
    let mut model = Model::new("m");
    let x = model.tensor("x", (2, 2), DType::F32);
    let exec = make_executor(model);
    let t = exec.tensor(x).unwrap();

    let src = HostArray::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], (2, 2)).unwrap();
    exec.tensor_memcpy_host_to_device(&t, &src).unwrap();

    let mut dst = HostArray::<f32>::zeros(4);
    exec.tensor_memcpy_device_to_host(&mut dst, &t).unwrap();
    assert_eq!(dst.to_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_strided_source_transfers_visible_elements() {
    let mut model = Model::new("m");
    let x = model.tensor("x", 3, DType::F32);
    let exec = make_executor(model);
    let t = exec.tensor(x).unwrap();

    let six = HostArray::from_vec(vec![10.0f32, 11.0, 12.0, 13.0, 14.0, 15.0], 6).unwrap();
    let every_other = six.step(0, 2).unwrap();
    assert!(!every_other.is_contiguous());
    exec.tensor_memcpy_host_to_device(&t, &every_other).unwrap();

    assert_eq!(read_back::<f32>(&exec, &t), vec![10.0, 12.0, 14.0]);
    // the caller's buffer is untouched
    assert_eq!(six.to_vec().unwrap(), vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
}

#[test]
fn test_strided_source_matches_manual_flatten() {
    let mut model = Model::new("m");
    let a = model.tensor("a", (3, 2), DType::I64);
    let b = model.tensor("b", (3, 2), DType::I64);
    let exec = make_executor(model);
    let (ta, tb) = (exec.tensor(a).unwrap(), exec.tensor(b).unwrap());

    let host = HostArray::from_vec((0..6).collect::<Vec<i64>>(), (2, 3)).unwrap();
    let transposed = host.transpose(0, 1).unwrap();
    let flattened = HostArray::from_vec(transposed.to_vec().unwrap(), (3, 2)).unwrap();

    exec.tensor_memcpy_host_to_device(&ta, &transposed).unwrap();
    exec.tensor_memcpy_host_to_device(&tb, &flattened).unwrap();
    assert_eq!(read_back::<i64>(&exec, &ta), read_back::<i64>(&exec, &tb));
    assert_eq!(read_back::<i64>(&exec, &ta), vec![0, 3, 1, 4, 2, 5]);
}

#[test]
fn test_contiguous_source_is_not_copied() {
    let src = HostArray::from_vec(vec![1u8, 2, 3], 3).unwrap();
    let used = contiguous_source(&src).unwrap();
    assert!(used.shares_storage(&src));

    // a dense window of a bigger array is contiguous too
    let big = HostArray::<u8>::zeros((4, 3));
    let rows = big.narrow(0, 1, 2).unwrap();
    assert!(contiguous_source(&rows).unwrap().shares_storage(&big));
}

#[test]
fn test_strided_device_tensor_round_trip() {
    // Host data goes into the columns 1..3 of a [3,4] device buffer.
    let mut model = Model::new("m");
    let base = model.tensor("base", (3, 4), DType::F32);
    let cols = model.narrow(base, 1, 1, 2).unwrap();
    let exec = make_executor(model);
    let (tb, tc) = (exec.tensor(base).unwrap(), exec.tensor(cols).unwrap());
    assert!(!tc.is_contiguous());

    let src = HostArray::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], (3, 2)).unwrap();
    exec.tensor_memcpy_host_to_device(&tc, &src).unwrap();

    assert_eq!(read_back::<f32>(&exec, &tc), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(
        read_back::<f32>(&exec, &tb),
        vec![0.0, 1.0, 2.0, 0.0, 0.0, 3.0, 4.0, 0.0, 0.0, 5.0, 6.0, 0.0]
    );
}

#[test]
fn test_transposed_device_view_reads_in_logical_order() {
    let mut model = Model::new("m");
    let base = model.tensor("base", (2, 3), DType::U32);
    let t_id = model.transpose(base, 0, 1).unwrap();
    let exec = make_executor(model);
    let (tb, tt) = (exec.tensor(base).unwrap(), exec.tensor(t_id).unwrap());

    let src = HostArray::from_vec(vec![0u32, 1, 2, 3, 4, 5], (2, 3)).unwrap();
    exec.tensor_memcpy_host_to_device(&tb, &src).unwrap();
    assert_eq!(read_back::<u32>(&exec, &tt), vec![0, 3, 1, 4, 2, 5]);
}

#[test]
fn test_explicit_view_layout() {
    let mut model = Model::new("m");
    let base = model.tensor("base", 8, DType::U8);
    let buffer = model.tensor_decl(base).unwrap().buffer;
    let layout = Layout::new(Shape::from((2, 2)), vec![4, 2], 1).unwrap();
    let view = model.view("odd", buffer, DType::U8, layout).unwrap();
    let exec = make_executor(model);
    let (tb, tv) = (exec.tensor(base).unwrap(), exec.tensor(view).unwrap());

    exec.tensor_memcpy_host_to_device(&tv, &HostArray::from_vec(vec![9u8, 8, 7, 6], (2, 2)).unwrap())
        .unwrap();
    assert_eq!(read_back::<u8>(&exec, &tb), vec![0, 9, 0, 8, 0, 7, 0, 6]);
}

#[test]
fn test_random_strided_views_round_trip() {
    let mut rng = StdRng::seed_from_u64(0xA5C);
    for _ in 0..32 {
        let rows = rng.gen_range(1..6);
        let cols = rng.gen_range(1..6);
        let mut model = Model::new("rand");
        let base = model.tensor("base", (rows, cols), DType::F32);
        let start = rng.gen_range(0..cols);
        let len = rng.gen_range(1..=cols - start);
        let narrowed = model.narrow(base, 1, start, len).unwrap();
        let view = if rng.gen_bool(0.5) {
            model.transpose(narrowed, 0, 1).unwrap()
        } else {
            narrowed
        };
        let exec = make_executor(model);
        let t = exec.tensor(view).unwrap();

        let data: Vec<f32> = (0..t.elem_count()).map(|_| rng.gen_range(-100.0..100.0)).collect();
        let src = HostArray::from_vec(data.clone(), t.shape().clone()).unwrap();
        exec.tensor_memcpy_host_to_device(&t, &src).unwrap();
        assert_eq!(read_back::<f32>(&exec, &t), data);
    }
}

// Rejections

#[test]
fn test_non_contiguous_destination_is_rejected() {
    let mut model = Model::new("m");
    let x = model.tensor("x", 3, DType::F32);
    let exec = make_executor(model);
    let t = exec.tensor(x).unwrap();
    exec.tensor_memcpy_host_to_device(&t, &HostArray::from_vec(vec![1.0f32, 2.0, 3.0], 3).unwrap())
        .unwrap();

    let six = HostArray::from_vec(vec![-1.0f32; 6], 6).unwrap();
    let mut view = six.step(0, 2).unwrap();
    let err = exec.tensor_memcpy_device_to_host(&mut view, &t).unwrap_err();
    assert!(matches!(err, Error::PreconditionViolation { arg: "dst", .. }));

    // neither side was touched
    assert_eq!(six.to_vec().unwrap(), vec![-1.0; 6]);
    assert_eq!(read_back::<f32>(&exec, &t), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_non_contiguous_destination_rejected_at_any_size() {
    for n in [1usize, 2, 5, 64] {
        let mut model = Model::new("m");
        let x = model.tensor("x", n, DType::F64);
        let exec = make_executor(model);
        let t = exec.tensor(x).unwrap();

        // a transposed [n+1, 2] array is never contiguous, and it is big
        // enough to hold the tensor
        let host = HostArray::<f64>::zeros((n + 1, 2)).transpose(0, 1).unwrap();
        let mut dst = host.clone();
        let err = exec.tensor_memcpy_device_to_host(&mut dst, &t).unwrap_err();
        assert!(
            matches!(err, Error::PreconditionViolation { .. }),
            "size {n}: {err}"
        );
    }
}

#[test]
fn test_wrong_element_type_is_invalid_argument() {
    let mut model = Model::new("m");
    let x = model.tensor("x", 4, DType::F32);
    let exec = make_executor(model);
    let t = exec.tensor(x).unwrap();

    let err = exec
        .tensor_memcpy_host_to_device(&t, &HostArray::<f64>::zeros(4))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { arg: "src", .. }));
    assert!(err.to_string().contains("f32"));

    let mut dst = HostArray::<half::f16>::zeros(4);
    let err = exec.tensor_memcpy_device_to_host(&mut dst, &t).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { arg: "dst", .. }));
}

#[test]
fn test_undersized_destination_is_rejected() {
    let mut model = Model::new("m");
    let x = model.tensor("x", (2, 4), DType::F32);
    let exec = make_executor(model);
    let t = exec.tensor(x).unwrap();
    let mut dst = HostArray::<f32>::zeros(7);
    let err = exec.tensor_memcpy_device_to_host(&mut dst, &t).unwrap_err();
    assert!(matches!(err, Error::PreconditionViolation { arg: "dst", .. }));
}

// Execution lifecycle

#[test]
fn test_lifecycle_delegates_to_runtime() {
    let exec = make_executor(Model::new("loop"));
    assert!(matches!(exec.launch(), Err(Error::InvalidUsage(_))));
    exec.compile().unwrap();
    exec.launch().unwrap();
    exec.run(5).unwrap();
    exec.wait().unwrap();
    assert!(matches!(exec.elapsed_msec(), Err(Error::InvalidUsage(_))));
    exec.stop().unwrap();
    assert!(exec.elapsed_msec().unwrap() >= 0.0);
    assert!(matches!(exec.run(1), Err(Error::InvalidUsage(_))));
}

#[test]
fn test_executor_is_shareable() {
    let mut model = Model::new("m");
    let x = model.tensor("x", 2, DType::U32);
    let exec = Arc::new(make_executor(model));
    let worker = {
        let exec = Arc::clone(&exec);
        std::thread::spawn(move || {
            let t = exec.tensor(x).unwrap();
            exec.tensor_memcpy_host_to_device(&t, &HostArray::from_vec(vec![7u32, 8], 2).unwrap())
        })
    };
    worker.join().unwrap().unwrap();
    let t = exec.tensor(x).unwrap();
    assert_eq!(read_back::<u32>(&exec, &t), vec![7, 8]);
}
