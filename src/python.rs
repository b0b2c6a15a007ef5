//! Python bindings for the grotto simulator using PyO3

use crate::config::SimConfig;
use crate::simulation::{run_and_aggregate, run_trials_sequential, RunOptions, Scenario};
use crate::stats::AggregatedStats;
use numpy::PyArray1;
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyErr::new::<PyValueError, _>(format!("Invalid config: {}", e))
}

fn stats_to_json(stats: &AggregatedStats) -> PyResult<String> {
    serde_json::to_string(stats)
        .map_err(|e| PyErr::new::<PyRuntimeError, _>(format!("Failed to serialize results: {}", e)))
}

/// Simulate the reference map. Returns a dict with the headline stats.
#[pyfunction]
#[pyo3(signature = (num_sims=50000, parallel=true, seed=None, exclude=None))]
fn simulate<'py>(
    py: Python<'py>,
    num_sims: usize,
    parallel: bool,
    seed: Option<u64>,
    exclude: Option<Vec<usize>>,
) -> PyResult<Bound<'py, PyDict>> {
    let mut scenario = Scenario::new(SimConfig::default()).map_err(value_error)?;
    if let Some(exclude) = exclude {
        scenario.exclude(&exclude).map_err(value_error)?;
    }
    let options = RunOptions {
        trials: num_sims,
        parallel,
        seed,
        threads: None,
    };

    // Release GIL during computation
    let stats = py.allow_threads(|| run_and_aggregate(&scenario, &options));

    let result_dict = PyDict::new(py);
    result_dict.set_item("trials", stats.trials)?;
    result_dict.set_item("avg_cost", stats.avg_cost)?;
    result_dict.set_item("std_cost", stats.std_cost)?;
    result_dict.set_item("std_error", stats.std_error)?;
    result_dict.set_item("min_cost", stats.min_cost)?;
    result_dict.set_item("max_cost", stats.max_cost)?;
    result_dict.set_item("avg_hops", stats.avg_hops)?;
    result_dict.set_item("avg_reloads", stats.avg_reloads)?;
    result_dict.set_item("avg_laps", stats.avg_laps)?;
    result_dict.set_item("avg_clear_position", stats.avg_clear_position)?;
    Ok(result_dict)
}

/// Simulate a scenario given as a JSON string, returning aggregated stats as JSON
#[pyfunction]
#[pyo3(signature = (config_json, num_sims, parallel=false, seed=None))]
fn simulate_json(
    py: Python<'_>,
    config_json: &str,
    num_sims: usize,
    parallel: bool,
    seed: Option<u64>,
) -> PyResult<String> {
    let config = SimConfig::from_json(config_json).map_err(value_error)?;
    let scenario = Scenario::new(config).map_err(value_error)?;
    let options = RunOptions {
        trials: num_sims,
        parallel,
        seed,
        threads: None,
    };

    let stats = py.allow_threads(|| run_and_aggregate(&scenario, &options));
    stats_to_json(&stats)
}

/// Simulate a scenario from a YAML or JSON file
#[pyfunction]
#[pyo3(signature = (config_path, num_sims, parallel=false))]
fn simulate_from_file(
    py: Python<'_>,
    config_path: &str,
    num_sims: usize,
    parallel: bool,
) -> PyResult<String> {
    let config = SimConfig::from_file(config_path)
        .map_err(|e| PyErr::new::<PyIOError, _>(format!("Failed to load config: {}", e)))?;
    let scenario = Scenario::new(config).map_err(value_error)?;
    let options = RunOptions {
        trials: num_sims,
        parallel,
        ..RunOptions::default()
    };

    let stats = py.allow_threads(|| run_and_aggregate(&scenario, &options));
    stats_to_json(&stats)
}

/// Per-trial total costs as a numpy array, for plotting distributions
#[pyfunction]
#[pyo3(signature = (config_json, num_sims, seed=0))]
fn trial_costs<'py>(
    py: Python<'py>,
    config_json: &str,
    num_sims: usize,
    seed: u64,
) -> PyResult<Bound<'py, PyArray1<i64>>> {
    let config = SimConfig::from_json(config_json).map_err(value_error)?;
    let scenario = Scenario::new(config).map_err(value_error)?;

    let costs: Vec<i64> = py.allow_threads(|| {
        run_trials_sequential(&scenario, num_sims, seed)
            .into_iter()
            .map(|r| r.total_cost)
            .collect()
    });
    Ok(PyArray1::from_vec(py, costs))
}

/// Get number of threads being used for parallel simulation
#[pyfunction]
fn get_thread_count() -> PyResult<usize> {
    Ok(rayon::current_num_threads())
}

/// Get number of available CPU cores
#[pyfunction]
fn get_available_cores() -> PyResult<usize> {
    Ok(num_cpus::get())
}

/// Python module definition
#[pymodule]
fn grotto_sim(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(simulate, m)?)?;
    m.add_function(wrap_pyfunction!(simulate_json, m)?)?;
    m.add_function(wrap_pyfunction!(simulate_from_file, m)?)?;
    m.add_function(wrap_pyfunction!(trial_costs, m)?)?;
    m.add_function(wrap_pyfunction!(get_thread_count, m)?)?;
    m.add_function(wrap_pyfunction!(get_available_cores, m)?)?;
    Ok(())
}
